//! Position collection
//!
//! For every (round range, time marker) pair, pulls each player's position at
//! the round's target tick. Tick rows with missing coordinates are dropped,
//! so a player dead or not yet connected at the target tick simply
//! contributes no sample for that round.

use std::collections::HashMap;

use crate::demo::{DemoData, TickRow};

use super::markers::{RoundRange, TimeMarker};
use super::ticks::{offset_ticks, round_target_tick};

/// One captured player position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSample {
    /// World X.
    pub x: f32,
    /// World Y.
    pub y: f32,
    /// World Z.
    pub z: f32,
    /// Round the sample was taken in.
    pub round_num: u32,
    /// Team side at the sample tick ("ct", "t", or "unknown").
    pub side: String,
}

/// All samples for one (round range, time marker) pair, grouped by player.
#[derive(Debug, Clone)]
pub struct MarkerPositions {
    /// Round range name ("first_half", ...).
    pub range_name: String,
    /// Round range label for reports.
    pub range_label: String,
    /// The marker these samples were taken at.
    pub marker: TimeMarker,
    /// Samples keyed by player name, in round order.
    pub by_player: HashMap<String, Vec<PositionSample>>,
}

impl MarkerPositions {
    /// Samples for one player, empty if the player never appeared.
    pub fn samples_for(&self, player: &str) -> &[PositionSample] {
        self.by_player.get(player).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Collect positions for every range/marker combination.
pub fn collect_positions(
    data: &DemoData,
    ranges: &[RoundRange],
    markers: &[TimeMarker],
    tickrate: f32,
) -> Vec<MarkerPositions> {
    // Index tick rows by (round, tick) once; every marker lookup is then a
    // single map probe instead of a table scan.
    let mut tick_index: HashMap<(u32, i64), Vec<&TickRow>> = HashMap::new();
    for row in &data.ticks {
        tick_index.entry((row.round_num, row.tick)).or_default().push(row);
    }

    let mut results = Vec::new();

    for range in ranges {
        for marker in markers {
            let offset = offset_ticks(marker.seconds_before_end, tickrate);
            let mut by_player: HashMap<String, Vec<PositionSample>> = HashMap::new();

            for round in &range.rounds {
                let Some(target) = round_target_tick(round, offset) else {
                    continue;
                };

                let Some(rows) = tick_index.get(&(round.round_num, target)) else {
                    continue;
                };

                for row in rows {
                    let Some((x, y, z)) = row.position() else {
                        continue;
                    };
                    by_player
                        .entry(row.name.clone())
                        .or_default()
                        .push(PositionSample {
                            x,
                            y,
                            z,
                            round_num: round.round_num,
                            side: row
                                .side
                                .as_deref()
                                .unwrap_or("unknown")
                                .to_lowercase(),
                        });
                }
            }

            results.push(MarkerPositions {
                range_name: range.name.clone(),
                range_label: range.label.clone(),
                marker: marker.clone(),
                by_player,
            });
        }
    }

    results
}

/// Most common side in a sample set, lowercased; "unknown" when empty.
pub fn dominant_side(samples: &[PositionSample]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for sample in samples {
        *counts.entry(sample.side.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by_key(|(side, count)| (*count, std::cmp::Reverse(*side)))
        .map(|(side, _)| side.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::markers::split_round_ranges;
    use crate::demo::parse_export_content;

    fn sample_demo() -> DemoData {
        // Two rounds at 64 tick; the 1m48s marker (7 s = 448 ticks before
        // end) lands on ticks 8952 and 17552.
        parse_export_content(
            r#"
{"type":"header","map_name":"de_mirage","tickrate":64.0}
{"type":"round","round_num":1,"freeze_end":1200,"end":9400}
{"type":"round","round_num":2,"freeze_end":10000,"end":18000}
{"type":"tick","round_num":1,"tick":8952,"name":"apex","x":-410.5,"y":618.0,"z":-63.9,"side":"T"}
{"type":"tick","round_num":1,"tick":8952,"name":"ropz","x":120.0,"y":-80.0,"z":1.5,"side":"ct"}
{"type":"tick","round_num":1,"tick":8953,"name":"apex","x":0.0,"y":0.0,"z":0.0,"side":"t"}
{"type":"tick","round_num":2,"tick":17552,"name":"apex","x":-410.5,"y":618.0,"z":-63.9,"side":"t"}
{"type":"tick","round_num":2,"tick":17552,"name":"ropz","x":130.0,"y":-90.0,"z":1.5}
"#,
        )
        .unwrap()
    }

    fn marker() -> TimeMarker {
        TimeMarker {
            label: "1m48s".to_string(),
            seconds_before_end: 7.0,
            display_time: "1:48".to_string(),
        }
    }

    #[test]
    fn test_collect_positions() {
        let data = sample_demo();
        let ranges = split_round_ranges(&data.rounds);
        let collected = collect_positions(&data, &ranges, &[marker()], 64.0);

        assert_eq!(collected.len(), 1);
        let apex = collected[0].samples_for("apex");
        assert_eq!(apex.len(), 2);
        assert_eq!(apex[0].round_num, 1);
        assert_eq!(apex[1].round_num, 2);
        // Side is normalized to lowercase.
        assert_eq!(apex[0].side, "t");
    }

    #[test]
    fn test_at_most_one_sample_per_round() {
        // The adjacent tick 8953 must not leak into the marker samples.
        let data = sample_demo();
        let ranges = split_round_ranges(&data.rounds);
        let collected = collect_positions(&data, &ranges, &[marker()], 64.0);

        let apex = collected[0].samples_for("apex");
        let round_one: Vec<_> = apex.iter().filter(|s| s.round_num == 1).collect();
        assert_eq!(round_one.len(), 1);
        assert_eq!(round_one[0].x, -410.5);
    }

    #[test]
    fn test_missing_side_becomes_unknown() {
        let data = sample_demo();
        let ranges = split_round_ranges(&data.rounds);
        let collected = collect_positions(&data, &ranges, &[marker()], 64.0);

        let ropz = collected[0].samples_for("ropz");
        assert_eq!(ropz.len(), 2);
        assert_eq!(ropz[1].side, "unknown");
    }

    #[test]
    fn test_one_result_per_range_marker_pair() {
        let data = sample_demo();
        let ranges = split_round_ranges(&data.rounds);
        let markers = crate::analysis::markers::default_markers();
        let collected = collect_positions(&data, &ranges, &markers, 64.0);
        assert_eq!(collected.len(), ranges.len() * markers.len());
    }

    #[test]
    fn test_dominant_side() {
        let data = sample_demo();
        let ranges = split_round_ranges(&data.rounds);
        let collected = collect_positions(&data, &ranges, &[marker()], 64.0);

        assert_eq!(dominant_side(collected[0].samples_for("apex")), "t");
        assert_eq!(dominant_side(&[]), "unknown");
    }
}
