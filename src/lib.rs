// =============================================================================
// Aurora Chart — indicator engine and synchronized chart core
// =============================================================================
//
// Core (synchronous, no I/O):
//   market_data  time normalization, the primary bar series
//   indicators   windowed statistics, SMA / Bollinger / RSI / momentum
//   chart        indicator slots and the crosshair query
//
// Host (tokio + axum):
//   update_queue  single writer in front of the coordinator
//   app_state     shared state for handlers
//   api           REST endpoints and the crosshair WebSocket
// =============================================================================

pub mod api;
pub mod app_state;
pub mod chart;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod runtime_config;
pub mod types;
pub mod update_queue;

pub use chart::{ChartSyncCoordinator, CrosshairSample, EnableOutcome};
pub use error::{ChartError, ChartResult};
pub use indicators::{IndicatorConfig, IndicatorId};
pub use types::{Bar, TimeKey, VolumeBar};
