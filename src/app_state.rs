// =============================================================================
// Central Application State — Aurora Chart host
// =============================================================================
//
// Ties the chart coordinator to the HTTP/WebSocket surface.
//
// Thread safety:
//   - All mutations go through `UpdateQueue`, one writer task.
//   - Readers (REST handlers, WebSocket crosshair queries) take
//     parking_lot read guards on the coordinator.
//   - `state_version` is bumped by the writer after every accepted command;
//     WebSocket connections use it to detect changes and re-push.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::chart::{ChartSyncCoordinator, CrosshairSample};
use crate::indicators::{SeriesPoint, TechnicalSummary};
use crate::runtime_config::RuntimeConfig;
use crate::types::{Bar, TimeKey, VolumeBar};
use crate::update_queue::UpdateQueue;

// =============================================================================
// Snapshots
// =============================================================================

/// One plotted line of an active indicator.
///
/// Point values are JSON numbers or `null`; a NaN from corrupt input is also
/// written as `null`, so it reads like a warm-up slot here. The crosshair
/// legend is where corruption stays visible.
#[derive(Debug, Clone, Serialize)]
pub struct LineSnapshot {
    pub key: String,
    pub points: Vec<SeriesPoint>,
}

/// Everything a chart surface needs to draw the current state.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSnapshot {
    pub state_version: u64,
    pub generation: u64,
    pub bars: Vec<Bar>,
    pub volume: Vec<VolumeBar>,
    pub lines: Vec<LineSnapshot>,
}

// =============================================================================
// AppState
// =============================================================================

/// Shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Bumped on every accepted chart mutation.
    pub state_version: Arc<AtomicU64>,

    // ── Configuration ───────────────────────────────────────────────────
    pub config: RuntimeConfig,

    // ── Chart ───────────────────────────────────────────────────────────
    pub coordinator: Arc<RwLock<ChartSyncCoordinator>>,
    pub updates: UpdateQueue,
}

impl AppState {
    /// Create the state and spawn its update queue. Default indicators from
    /// the config are enabled up front; invalid entries are skipped.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: RuntimeConfig) -> Self {
        let mut coordinator = ChartSyncCoordinator::new();
        for indicator in &config.default_indicators {
            if let Err(e) = coordinator.enable(*indicator) {
                warn!(indicator = ?indicator, error = %e, "default indicator skipped");
            }
        }
        info!(
            indicators = coordinator.active_ids().len(),
            granularity = ?config.granularity,
            "chart state initialised"
        );

        let coordinator = Arc::new(RwLock::new(coordinator));
        let state_version = Arc::new(AtomicU64::new(0));
        let updates = UpdateQueue::spawn(
            coordinator.clone(),
            state_version.clone(),
            config.granularity,
            config.update_queue_capacity,
        );

        Self {
            state_version,
            config,
            coordinator,
            updates,
        }
    }

    // =========================================================================
    // Version management
    // =========================================================================

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Read-side queries
    // =========================================================================

    pub fn crosshair(&self, time: Option<TimeKey>) -> CrosshairSample {
        self.coordinator.read().resolve_crosshair(time)
    }

    pub fn summary(&self) -> TechnicalSummary {
        let params = self.config.summary_params();
        self.coordinator.read().summary(&params)
    }

    pub fn build_snapshot(&self) -> ChartSnapshot {
        let coordinator = self.coordinator.read();
        let lines = coordinator
            .active_series()
            .flat_map(|s| s.lines.iter())
            .map(|line| LineSnapshot {
                key: line.key.clone(),
                points: line.points(),
            })
            .collect();

        ChartSnapshot {
            state_version: self.current_state_version(),
            generation: coordinator.generation(),
            bars: coordinator.bars().to_vec(),
            volume: coordinator.volume().to_vec(),
            lines,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorConfig;
    use crate::market_data::{RawBar, RawTime};
    use crate::update_queue::{ChartCommand, CommandOutcome};

    fn raw_bars(n: usize) -> Vec<RawBar> {
        (0..n)
            .map(|i| RawBar {
                time: RawTime::Epoch(1_704_153_600 + i as i64 * 86_400),
                open: 10.0,
                high: 12.0,
                low: 9.0,
                close: 10.0 + i as f64,
            })
            .collect()
    }

    #[tokio::test]
    async fn new_state_enables_default_indicators() {
        let state = AppState::new(RuntimeConfig::default());
        let ids = state.coordinator.read().active_ids();
        assert_eq!(ids.len(), 4);
        assert!(ids.contains(&IndicatorConfig::sma(200).id()));
        assert_eq!(state.current_state_version(), 0);
    }

    #[tokio::test]
    async fn invalid_default_indicator_is_skipped() {
        let mut config = RuntimeConfig::default();
        config.default_indicators = vec![IndicatorConfig::sma(0), IndicatorConfig::rsi(14)];
        let state = AppState::new(config);
        assert_eq!(state.coordinator.read().active_ids(), vec![IndicatorConfig::rsi(14).id()]);
    }

    #[tokio::test]
    async fn snapshot_reflects_queued_replace() {
        let mut config = RuntimeConfig::default();
        config.default_indicators = vec![IndicatorConfig::sma(3)];
        let state = AppState::new(config);

        let outcome = state
            .updates
            .submit(ChartCommand::ReplaceRange {
                bars: raw_bars(5),
                volume: Vec::new(),
            })
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, CommandOutcome::Replaced { generation: 1, .. }));

        let snapshot = state.build_snapshot();
        assert_eq!(snapshot.state_version, 1);
        assert_eq!(snapshot.bars.len(), 5);
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].key, "MA:3");
        assert_eq!(snapshot.lines[0].points.len(), 5);

        let summary = state.summary();
        assert_eq!(summary.close, Some(14.0));
        assert_eq!(state.crosshair(None).series_values.len(), 1);
    }
}
