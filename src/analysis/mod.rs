//! Position analysis: markers, target-tick arithmetic, collection, and
//! frequency aggregation.

pub mod frequency;
pub mod markers;
pub mod positions;
pub mod ticks;

pub use frequency::{FrequencyTable, Occurrence, PosKey, PositionBucket};
pub use markers::{
    AnalysisConfig, MapOverride, RoundRange, TimeMarker, default_markers, split_round_ranges,
};
pub use positions::{MarkerPositions, PositionSample, collect_positions, dominant_side};
pub use ticks::{offset_ticks, round_target_tick, target_tick};
