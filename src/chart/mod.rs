pub mod coordinator;
pub mod crosshair;

pub use coordinator::{ChartSyncCoordinator, EnableOutcome};
pub use crosshair::{format_value, CrosshairSample, NO_DATA};
