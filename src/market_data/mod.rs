pub mod aligner;
pub mod bar_series;

// Re-export the inbound types for convenient access (e.g. `use crate::market_data::RawBar`).
pub use aligner::{align_bars, normalize_time, pair_volume, Granularity, RawBar, RawTime, RawVolume};
pub use bar_series::{BarSeries, LiveApplied, LiveUpdate};
