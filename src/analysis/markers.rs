//! Time markers and round-range segmentation
//!
//! A time marker names an in-round timestamp measured in seconds before the
//! round end tick. The defaults match the standard 1:48 / 1:47 / 1:46 set;
//! a TOML config file can replace them.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::demo::RoundRow;

/// Rounds per half in regulation.
pub const ROUNDS_PER_HALF: usize = 12;

/// A single analysis timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeMarker {
    /// Short label used in file names (e.g. "1m48s").
    pub label: String,
    /// Seconds before the round end tick.
    pub seconds_before_end: f32,
    /// Clock time shown in reports (e.g. "1:48").
    pub display_time: String,
}

/// Default marker set: 7, 8, and 9 seconds before round end.
pub fn default_markers() -> Vec<TimeMarker> {
    vec![
        TimeMarker {
            label: "1m48s".to_string(),
            seconds_before_end: 7.0,
            display_time: "1:48".to_string(),
        },
        TimeMarker {
            label: "1m47s".to_string(),
            seconds_before_end: 8.0,
            display_time: "1:47".to_string(),
        },
        TimeMarker {
            label: "1m46s".to_string(),
            seconds_before_end: 9.0,
            display_time: "1:46".to_string(),
        },
    ]
}

/// Map calibration override entry, matching `heatmap::MapCalibration` fields.
#[derive(Debug, Clone, Deserialize)]
pub struct MapOverride {
    /// World X of the radar image's left edge.
    pub pos_x: f32,
    /// World Y of the radar image's top edge.
    pub pos_y: f32,
    /// World units per radar pixel.
    pub scale: f32,
    /// Samples below this Z are skipped when drawing markers.
    pub marker_z_floor: Option<f32>,
}

/// Analysis config file contents.
///
/// ```toml
/// [[marker]]
/// label = "1m30s"
/// seconds_before_end = 25.0
/// display_time = "1:30"
///
/// [maps.de_custom]
/// pos_x = -2000.0
/// pos_y = 2000.0
/// scale = 4.0
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    /// Marker list; empty means keep the defaults.
    #[serde(default)]
    pub marker: Vec<TimeMarker>,
    /// Per-map calibration overrides keyed by map name.
    #[serde(default)]
    pub maps: std::collections::HashMap<String, MapOverride>,
}

impl AnalysisConfig {
    /// Load a config file, if one was given.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read config file: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config file: {}", e))
    }

    /// Markers to analyze: configured ones, or the defaults.
    pub fn markers(&self) -> Vec<TimeMarker> {
        if self.marker.is_empty() {
            default_markers()
        } else {
            self.marker.clone()
        }
    }
}

/// A contiguous segment of rounds analyzed and rendered together.
#[derive(Debug, Clone)]
pub struct RoundRange {
    /// Segment name used in file names ("first_half", "second_half",
    /// "overtime").
    pub name: String,
    /// Human-readable label for reports.
    pub label: String,
    /// Round rows in this segment.
    pub rounds: Vec<RoundRow>,
}

impl RoundRange {
    /// Round number of the first round in the segment.
    pub fn first_round_num(&self) -> u32 {
        self.rounds.first().map(|r| r.round_num).unwrap_or(1)
    }

    /// Display round number, 1-based within the segment. Halves wrap at 12;
    /// rounds before the segment start render as "?".
    pub fn display_round(&self, round_num: u32) -> String {
        let first = self.first_round_num();
        if round_num < first {
            return "?".to_string();
        }
        let mut adjusted = round_num - first + 1;
        if self.name != "overtime" && adjusted > ROUNDS_PER_HALF as u32 {
            adjusted = (adjusted - 1) % ROUNDS_PER_HALF as u32 + 1;
        }
        adjusted.to_string()
    }
}

/// Segment rounds into first half (1-12), second half (13-24), and overtime
/// (25+). Every round lands in exactly one segment.
pub fn split_round_ranges(rounds: &[RoundRow]) -> Vec<RoundRange> {
    let total = rounds.len();
    let mut ranges = Vec::new();

    if total >= 1 {
        let end = total.min(ROUNDS_PER_HALF);
        ranges.push(RoundRange {
            name: "first_half".to_string(),
            label: format!("Rounds 1-{} (First Half)", end),
            rounds: rounds[0..end].to_vec(),
        });
    }

    if total > ROUNDS_PER_HALF {
        let end = total.min(ROUNDS_PER_HALF * 2);
        ranges.push(RoundRange {
            name: "second_half".to_string(),
            label: format!("Rounds {}-{} (Second Half)", ROUNDS_PER_HALF + 1, end),
            rounds: rounds[ROUNDS_PER_HALF..end].to_vec(),
        });
    }

    if total > ROUNDS_PER_HALF * 2 {
        ranges.push(RoundRange {
            name: "overtime".to_string(),
            label: format!("Rounds {}+ (Overtime)", ROUNDS_PER_HALF * 2 + 1),
            rounds: rounds[ROUNDS_PER_HALF * 2..].to_vec(),
        });
    }

    ranges
}
