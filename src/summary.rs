//! JSON summary output
//!
//! Serializes the per-player frequency table. Two files are written per run:
//! the full summary covering every player, and a filtered one holding only
//! the analyzed player.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::FrequencyTable;

/// One occurrence of a position in the written summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceSummary {
    pub round: u32,
    pub side: String,
    pub time_label: String,
    pub range_label: String,
}

/// One aggregated position entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSummary {
    /// [x, y, z]
    pub position: [f32; 3],
    pub count: u32,
    pub occurrences: Vec<OccurrenceSummary>,
}

/// All aggregated positions for one player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub player: String,
    pub positions: Vec<PositionSummary>,
}

/// Top-level summary document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryFile {
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    /// Map the demo was recorded on.
    pub map_name: String,
    /// Per-player entries, sorted by player name.
    pub players: Vec<PlayerSummary>,
}

impl SummaryFile {
    /// Copy of this summary holding only the named player.
    pub fn filtered_to(&self, player: &str) -> Self {
        Self {
            generated_at: self.generated_at.clone(),
            map_name: self.map_name.clone(),
            players: self
                .players
                .iter()
                .filter(|p| p.player == player)
                .cloned()
                .collect(),
        }
    }

    /// Total observation count for one player.
    pub fn total_count_for(&self, player: &str) -> u32 {
        self.players
            .iter()
            .filter(|p| p.player == player)
            .flat_map(|p| p.positions.iter())
            .map(|pos| pos.count)
            .sum()
    }
}

/// Build the summary document from an aggregated table.
pub fn build_summary(table: &FrequencyTable, map_name: &str) -> SummaryFile {
    let mut players = Vec::new();

    for player in table.players() {
        let positions_map = &table.by_player[&player];

        let mut positions: Vec<PositionSummary> = positions_map
            .iter()
            .map(|(key, bucket)| {
                let (x, y, z) = key.coords();
                PositionSummary {
                    position: [x, y, z],
                    count: bucket.count,
                    occurrences: bucket
                        .occurrences
                        .iter()
                        .map(|o| OccurrenceSummary {
                            round: o.round,
                            side: o.side.clone(),
                            time_label: o.time_label.clone(),
                            range_label: o.range_label.clone(),
                        })
                        .collect(),
                }
            })
            .collect();

        // Highest counts first, then first occurrence, for stable output.
        positions.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.occurrences.first().map(|o| o.round).cmp(
                    &b.occurrences.first().map(|o| o.round),
                ))
                .then_with(|| a.position.partial_cmp(&b.position).unwrap_or(std::cmp::Ordering::Equal))
        });

        players.push(PlayerSummary { player, positions });
    }

    SummaryFile {
        generated_at: chrono::Utc::now().to_rfc3339(),
        map_name: map_name.to_string(),
        players,
    }
}

/// File-name-safe form of a player name (spaces become underscores).
pub fn sanitize_player_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Write the full and target-player summary files. Returns the written paths.
pub fn write_summary(
    out_dir: &Path,
    summary: &SummaryFile,
    target_player: &str,
) -> Result<(PathBuf, PathBuf), String> {
    fs::create_dir_all(out_dir)
        .map_err(|e| format!("failed to create output directory: {}", e))?;

    let safe_name = sanitize_player_name(target_player);
    let full_path = out_dir.join(format!("positions_{}.json", safe_name));
    let target_path = out_dir.join(format!("positions_{}_target.json", safe_name));

    let full_json = serde_json::to_string_pretty(summary)
        .map_err(|e| format!("failed to serialize summary: {}", e))?;
    fs::write(&full_path, full_json)
        .map_err(|e| format!("failed to write {}: {}", full_path.display(), e))?;

    let target_json = serde_json::to_string_pretty(&summary.filtered_to(target_player))
        .map_err(|e| format!("failed to serialize target summary: {}", e))?;
    fs::write(&target_path, target_json)
        .map_err(|e| format!("failed to write {}: {}", target_path.display(), e))?;

    Ok((full_path, target_path))
}
