//! demoscope - player position analysis for CS2 demo exports
//!
//! Consumes the tabular export of an upstream demo parser (JSONL or SQLite),
//! samples player positions at fixed in-round timestamps, aggregates repeated
//! positions per player, renders density heatmaps for one player, and writes
//! JSON summaries.

pub mod analysis;
pub mod demo;
pub mod heatmap;
pub mod summary;

// Re-export commonly used types for convenience
pub use analysis::{
    AnalysisConfig, FrequencyTable, MarkerPositions, PosKey, PositionSample, RoundRange,
    TimeMarker, collect_positions, default_markers, dominant_side, split_round_ranges,
};
pub use demo::{
    DEFAULT_TICKRATE, DemoData, DemoHeader, RoundRow, TickRow, load_json_export,
    load_sqlite_export,
};
pub use heatmap::{MapCalibration, render_combined_heatmap, render_marker_heatmap};
pub use summary::{SummaryFile, build_summary, sanitize_player_name, write_summary};
