// =============================================================================
// Update Queue — the single writer in front of the chart coordinator
// =============================================================================
//
// The coordinator is not thread-safe by itself. Every mutation (range
// replace, live tick, indicator toggle) is sent through one bounded mpsc
// channel and applied by one task, each command under a single write guard,
// so readers never observe a half-applied update.
//
// A newer range replace simply lands after an older one (last write wins);
// live ticks that were queued for the older range are then rejected as stale.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::chart::{ChartSyncCoordinator, EnableOutcome};
use crate::error::ChartResult;
use crate::indicators::{IndicatorConfig, IndicatorId};
use crate::market_data::{
    align_bars, normalize_time, pair_volume, Granularity, LiveApplied, LiveUpdate, RawBar, RawVolume,
};
use crate::types::Bar;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A live tick as delivered by the streaming collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLiveUpdate {
    pub generation: u64,
    pub bar: RawBar,
    #[serde(default)]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum ChartCommand {
    ReplaceRange {
        bars: Vec<RawBar>,
        volume: Vec<RawVolume>,
    },
    Live(RawLiveUpdate),
    Enable(IndicatorConfig),
    Disable(IndicatorId),
}

impl ChartCommand {
    fn label(&self) -> &'static str {
        match self {
            Self::ReplaceRange { .. } => "replace_range",
            Self::Live(_) => "live",
            Self::Enable(_) => "enable",
            Self::Disable(_) => "disable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Replaced { generation: u64, bars: usize },
    Live { applied: LiveApplied },
    Enabled { id: IndicatorId, result: EnableOutcome },
    Disabled { id: IndicatorId, was_active: bool },
}

/// Apply one command to the coordinator. Failures leave it untouched.
pub fn apply_command(
    coordinator: &mut ChartSyncCoordinator,
    command: ChartCommand,
    granularity: Granularity,
) -> ChartResult<CommandOutcome> {
    match command {
        ChartCommand::ReplaceRange { bars, volume } => {
            let aligned = align_bars(&bars, granularity)?;
            let paired = pair_volume(&aligned, &volume, granularity)?;
            let count = aligned.len();
            let generation = coordinator.replace_range(aligned, paired)?;
            Ok(CommandOutcome::Replaced {
                generation,
                bars: count,
            })
        }
        ChartCommand::Live(raw) => {
            let time = normalize_time(&raw.bar.time, granularity)?;
            let update = LiveUpdate {
                generation: raw.generation,
                bar: Bar {
                    time,
                    open: raw.bar.open,
                    high: raw.bar.high,
                    low: raw.bar.low,
                    close: raw.bar.close,
                },
                volume: raw.volume,
            };
            let applied = coordinator.apply_live(&update)?;
            Ok(CommandOutcome::Live { applied })
        }
        ChartCommand::Enable(config) => {
            let result = coordinator.enable(config)?;
            Ok(CommandOutcome::Enabled {
                id: config.id(),
                result,
            })
        }
        ChartCommand::Disable(id) => {
            let was_active = coordinator.disable(&id);
            Ok(CommandOutcome::Disabled { id, was_active })
        }
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

struct QueuedCommand {
    command: ChartCommand,
    reply: oneshot::Sender<ChartResult<CommandOutcome>>,
}

/// Handle for submitting chart mutations to the single writer task.
#[derive(Clone)]
pub struct UpdateQueue {
    tx: mpsc::Sender<QueuedCommand>,
}

impl UpdateQueue {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    pub fn spawn(
        coordinator: Arc<RwLock<ChartSyncCoordinator>>,
        version: Arc<AtomicU64>,
        granularity: Granularity,
        capacity: usize,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<QueuedCommand>(capacity.max(1));

        tokio::spawn(async move {
            info!(capacity, "chart update queue started");
            while let Some(QueuedCommand { command, reply }) = rx.recv().await {
                let label = command.label();
                let result = {
                    let mut guard = coordinator.write();
                    apply_command(&mut guard, command, granularity)
                };

                match &result {
                    Ok(outcome) => {
                        version.fetch_add(1, Ordering::Relaxed);
                        debug!(command = label, ?outcome, "chart command applied");
                    }
                    Err(e) => warn!(command = label, error = %e, "chart command rejected"),
                }

                // The submitter may have gone away; the update still stands.
                let _ = reply.send(result);
            }
            info!("chart update queue closed");
        });

        Self { tx }
    }

    /// Queue a command and wait for its result.
    ///
    /// The outer error means the writer task is gone; the inner one is the
    /// coordinator's verdict.
    pub async fn submit(&self, command: ChartCommand) -> Result<ChartResult<CommandOutcome>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(QueuedCommand { command, reply })
            .await
            .ok()
            .context("chart update queue is closed")?;
        rx.await.context("chart update queue dropped the command")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
