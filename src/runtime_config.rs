// =============================================================================
// Runtime Configuration — chart defaults loaded at startup
// =============================================================================
//
// Every tunable parameter of the chart core lives here: which indicators are
// shown when a chart opens, the parameters of the summary badges, how epoch
// times are mapped onto the key space, and the host's queue sizing.
//
// All fields carry `#[serde(default)]` so that adding new fields never breaks
// loading an older config file. The file is only read; persisting settings is
// the dashboard's job.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::config::{
    IndicatorConfig, DEFAULT_BOLLINGER_LENGTH, DEFAULT_BOLLINGER_MULTIPLIER, DEFAULT_RSI_PERIOD,
};
use crate::indicators::momentum::{DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW};
use crate::indicators::summary::SummaryParams;
use crate::market_data::Granularity;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_ma_lengths() -> Vec<usize> {
    vec![20, 50, 200]
}

fn default_bollinger_length() -> usize {
    DEFAULT_BOLLINGER_LENGTH
}

fn default_bollinger_multiplier() -> f64 {
    DEFAULT_BOLLINGER_MULTIPLIER
}

fn default_rsi_period() -> usize {
    DEFAULT_RSI_PERIOD
}

fn default_momentum_lookback() -> usize {
    DEFAULT_LOOKBACK
}

fn default_momentum_recent_window() -> usize {
    DEFAULT_RECENT_WINDOW
}

fn default_indicators() -> Vec<IndicatorConfig> {
    let mut indicators: Vec<IndicatorConfig> = default_ma_lengths()
        .into_iter()
        .map(IndicatorConfig::sma)
        .collect();
    indicators.push(IndicatorConfig::bollinger(
        DEFAULT_BOLLINGER_LENGTH,
        DEFAULT_BOLLINGER_MULTIPLIER,
    ));
    indicators
}

fn default_update_queue_capacity() -> usize {
    256
}

fn default_crosshair_decimals() -> usize {
    2
}

fn default_push_interval_ms() -> u64 {
    500
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration of the chart service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Time axis -----------------------------------------------------------

    /// How epoch instants map onto time keys (daily bars by default).
    #[serde(default)]
    pub granularity: Granularity,

    // --- Indicators ----------------------------------------------------------

    /// Indicators enabled when the chart opens.
    #[serde(default = "default_indicators")]
    pub default_indicators: Vec<IndicatorConfig>,

    /// Moving-average lengths reported in the summary badges.
    #[serde(default = "default_ma_lengths")]
    pub ma_lengths: Vec<usize>,

    #[serde(default = "default_bollinger_length")]
    pub bollinger_length: usize,

    #[serde(default = "default_bollinger_multiplier")]
    pub bollinger_multiplier: f64,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// Sessions in the momentum lookback window (~6 months).
    #[serde(default = "default_momentum_lookback")]
    pub momentum_lookback: usize,

    /// Sessions in the "recent" momentum horizon (~1 month).
    #[serde(default = "default_momentum_recent_window")]
    pub momentum_recent_window: usize,

    // --- Host ----------------------------------------------------------------

    /// Bound on queued chart mutations before submitters wait.
    #[serde(default = "default_update_queue_capacity")]
    pub update_queue_capacity: usize,

    /// Decimals used for crosshair legend strings.
    #[serde(default = "default_crosshair_decimals")]
    pub crosshair_decimals: usize,

    /// How often a WebSocket checks for chart changes to re-send the hovered
    /// sample.
    #[serde(default = "default_push_interval_ms")]
    pub push_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            default_indicators: default_indicators(),
            ma_lengths: default_ma_lengths(),
            bollinger_length: default_bollinger_length(),
            bollinger_multiplier: default_bollinger_multiplier(),
            rsi_period: default_rsi_period(),
            momentum_lookback: default_momentum_lookback(),
            momentum_recent_window: default_momentum_recent_window(),
            update_queue_capacity: default_update_queue_capacity(),
            crosshair_decimals: default_crosshair_decimals(),
            push_interval_ms: default_push_interval_ms(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read chart config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse chart config from {}", path.display()))?;

        info!(
            path = %path.display(),
            granularity = ?config.granularity,
            indicators = config.default_indicators.len(),
            "chart config loaded"
        );

        Ok(config)
    }

    /// Parameters of the latest-bar summary.
    pub fn summary_params(&self) -> SummaryParams {
        SummaryParams {
            ma_lengths: self.ma_lengths.clone(),
            bollinger_length: self.bollinger_length,
            bollinger_multiplier: self.bollinger_multiplier,
            rsi_period: self.rsi_period,
            momentum_lookback: self.momentum_lookback,
            momentum_recent_window: self.momentum_recent_window,
        }
    }
}
