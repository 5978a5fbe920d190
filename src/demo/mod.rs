//! Demo export data model
//!
//! The upstream demo parser emits three tables: a header, per-round
//! boundaries, and per-tick player states. Their schema is a fixed contract;
//! this module only mirrors it. Loaders for the two export formats live in
//! `json_loader` and `sqlite_loader` and both produce the same `DemoData`.

pub mod json_loader;
pub mod sqlite_loader;

pub use json_loader::{load_json_export, parse_export_content};
pub use sqlite_loader::{load_sqlite_export, load_from_connection};

use serde::{Deserialize, Serialize};

/// Tickrate assumed when the export header does not carry one.
pub const DEFAULT_TICKRATE: f32 = 128.0;

/// Demo header metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoHeader {
    /// Map the demo was recorded on (e.g. "de_mirage").
    pub map_name: String,
    /// Simulation ticks per second, if the exporter knew it.
    pub tickrate: Option<f32>,
}

impl Default for DemoHeader {
    fn default() -> Self {
        Self {
            map_name: "de_unknown".to_string(),
            tickrate: None,
        }
    }
}

impl DemoHeader {
    /// Tickrate with the standard fallback applied.
    pub fn tickrate_or_default(&self) -> f32 {
        self.tickrate.unwrap_or(DEFAULT_TICKRATE)
    }
}

/// One row of the rounds table: boundaries of a single round.
///
/// Exporters differ in which boundary columns they fill, so every tick field
/// is optional and resolved through `start_tick` / `end_tick`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRow {
    /// 1-based round number.
    pub round_num: u32,
    /// Tick at which freeze time ended (round clock start).
    pub freeze_end: Option<i64>,
    /// Raw round start tick (fallback when freeze_end is absent).
    pub start: Option<i64>,
    /// Round end tick.
    pub end: Option<i64>,
    /// Official round end tick (fallback when end is absent).
    pub end_official: Option<i64>,
}

impl RoundRow {
    /// Effective round start: freeze end, falling back to the raw start.
    pub fn start_tick(&self) -> Option<i64> {
        self.freeze_end.or(self.start)
    }

    /// Effective round end: end, falling back to the official end.
    pub fn end_tick(&self) -> Option<i64> {
        self.end.or(self.end_official)
    }
}

/// One row of the ticks table: a single player's state at a single tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRow {
    /// Round this tick belongs to.
    pub round_num: u32,
    /// Tick index.
    pub tick: i64,
    /// Player name.
    pub name: String,
    /// World X, absent if the player had no position at this tick.
    pub x: Option<f32>,
    /// World Y.
    pub y: Option<f32>,
    /// World Z.
    pub z: Option<f32>,
    /// Team side at this tick ("ct" or "t").
    pub side: Option<String>,
}

impl TickRow {
    /// Full position triple, or None if any coordinate is missing.
    pub fn position(&self) -> Option<(f32, f32, f32)> {
        match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) => Some((x, y, z)),
            _ => None,
        }
    }
}

/// Complete parsed demo export.
#[derive(Debug, Clone, Default)]
pub struct DemoData {
    /// Header metadata.
    pub header: DemoHeader,
    /// Round boundary rows, in round order.
    pub rounds: Vec<RoundRow>,
    /// Per-tick player state rows.
    pub ticks: Vec<TickRow>,
}

impl DemoData {
    /// Sorted unique player names seen in the tick table.
    pub fn players(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ticks.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Resolve a `--player` argument: a 1-based index into the sorted player
    /// list, or a literal player name.
    pub fn resolve_player(&self, arg: &str) -> Result<String, String> {
        let players = self.players();
        if players.is_empty() {
            return Err("no players found in the demo tick data".to_string());
        }

        if arg.chars().all(|c| c.is_ascii_digit()) {
            let idx: usize = arg
                .parse()
                .map_err(|e| format!("could not parse player index '{}': {}", arg, e))?;
            if idx >= 1 && idx <= players.len() {
                Ok(players[idx - 1].clone())
            } else {
                Err(format!(
                    "player index '{}' is out of range (1-{})",
                    idx,
                    players.len()
                ))
            }
        } else if players.iter().any(|p| p == arg) {
            Ok(arg.to_string())
        } else {
            Err(format!("player name '{}' not found in the demo", arg))
        }
    }

    /// Number of rounds in the export.
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(name: &str) -> TickRow {
        TickRow {
            round_num: 1,
            tick: 100,
            name: name.to_string(),
            x: Some(0.0),
            y: Some(0.0),
            z: Some(0.0),
            side: Some("ct".to_string()),
        }
    }

    #[test]
    fn test_round_boundary_fallbacks() {
        let row = RoundRow {
            round_num: 1,
            freeze_end: None,
            start: Some(500),
            end: None,
            end_official: Some(9000),
        };
        assert_eq!(row.start_tick(), Some(500));
        assert_eq!(row.end_tick(), Some(9000));

        let row = RoundRow {
            round_num: 2,
            freeze_end: Some(400),
            start: Some(350),
            end: Some(8000),
            end_official: Some(8100),
        };
        // Preferred columns win over fallbacks.
        assert_eq!(row.start_tick(), Some(400));
        assert_eq!(row.end_tick(), Some(8000));
    }

    #[test]
    fn test_players_sorted_and_deduped() {
        let data = DemoData {
            ticks: vec![tick("zywoo"), tick("apex"), tick("zywoo"), tick("misutaaa")],
            ..Default::default()
        };
        assert_eq!(data.players(), vec!["apex", "misutaaa", "zywoo"]);
    }

    #[test]
    fn test_resolve_player_by_index_and_name() {
        let data = DemoData {
            ticks: vec![tick("b"), tick("a"), tick("c")],
            ..Default::default()
        };
        assert_eq!(data.resolve_player("2").unwrap(), "b");
        assert_eq!(data.resolve_player("c").unwrap(), "c");
        assert!(data.resolve_player("4").is_err());
        assert!(data.resolve_player("0").is_err());
        assert!(data.resolve_player("nobody").is_err());
    }

    #[test]
    fn test_position_requires_all_coordinates() {
        let mut t = tick("a");
        assert_eq!(t.position(), Some((0.0, 0.0, 0.0)));
        t.z = None;
        assert_eq!(t.position(), None);
    }

    #[test]
    fn test_tickrate_fallback() {
        let header = DemoHeader::default();
        assert_eq!(header.tickrate_or_default(), DEFAULT_TICKRATE);

        let header = DemoHeader {
            map_name: "de_mirage".to_string(),
            tickrate: Some(64.0),
        };
        assert_eq!(header.tickrate_or_default(), 64.0);
    }
}
