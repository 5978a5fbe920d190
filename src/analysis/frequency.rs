//! Position frequency aggregation
//!
//! Counts repeated position triples per player across every processed round
//! range and time marker. Positions are keyed by their exact `f32` bit
//! patterns, so only bit-identical triples aggregate into one entry.

use std::collections::HashMap;

use super::positions::MarkerPositions;

/// Hashable key for an exact position triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PosKey {
    x: u32,
    y: u32,
    z: u32,
}

impl PosKey {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: x.to_bits(),
            y: y.to_bits(),
            z: z.to_bits(),
        }
    }

    /// Recover the original coordinates.
    pub fn coords(&self) -> (f32, f32, f32) {
        (
            f32::from_bits(self.x),
            f32::from_bits(self.y),
            f32::from_bits(self.z),
        )
    }
}

/// One recorded occurrence of a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Round the position was sampled in.
    pub round: u32,
    /// Player side at the sample.
    pub side: String,
    /// Marker label ("1m48s", ...).
    pub time_label: String,
    /// Round range label.
    pub range_label: String,
}

/// Count and occurrence detail for one position.
#[derive(Debug, Clone, Default)]
pub struct PositionBucket {
    /// How many times the exact position was observed.
    pub count: u32,
    /// One entry per observation.
    pub occurrences: Vec<Occurrence>,
}

/// Per-player position frequency table.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    /// player name -> position -> bucket
    pub by_player: HashMap<String, HashMap<PosKey, PositionBucket>>,
}

impl FrequencyTable {
    /// Aggregate every collected range/marker sample set.
    pub fn from_marker_positions(items: &[MarkerPositions]) -> Self {
        let mut table = Self::default();

        for item in items {
            for (player, samples) in &item.by_player {
                let positions = table.by_player.entry(player.clone()).or_default();
                for sample in samples {
                    let bucket = positions
                        .entry(PosKey::new(sample.x, sample.y, sample.z))
                        .or_default();
                    bucket.count += 1;
                    bucket.occurrences.push(Occurrence {
                        round: sample.round_num,
                        side: sample.side.clone(),
                        time_label: item.marker.label.clone(),
                        range_label: item.range_label.clone(),
                    });
                }
            }
        }

        // Occurrence order is part of the output contract.
        for positions in table.by_player.values_mut() {
            for bucket in positions.values_mut() {
                bucket
                    .occurrences
                    .sort_by(|a, b| (a.round, &a.time_label).cmp(&(b.round, &b.time_label)));
            }
        }

        table
    }

    /// Total observation count for one player across all positions.
    pub fn total_count_for(&self, player: &str) -> u32 {
        self.by_player
            .get(player)
            .map(|positions| positions.values().map(|b| b.count).sum())
            .unwrap_or(0)
    }

    /// Player names present in the table, sorted.
    pub fn players(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_player.keys().cloned().collect();
        names.sort();
        names
    }
}
