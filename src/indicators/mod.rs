// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator computations. Windowed values that cannot
// be computed yet are `None`; latest-bar readings fall back to documented
// neutral defaults instead of failing.

pub mod bollinger;
pub mod config;
pub mod engine;
pub mod momentum;
pub mod rsi;
pub mod sma;
pub mod summary;
pub mod window;

pub use config::{IndicatorConfig, IndicatorId};
pub use engine::{build_series, DerivedSeries, IndicatorSeries, SeriesPoint};
pub use summary::{summarize, SummaryParams, TechnicalSummary};
