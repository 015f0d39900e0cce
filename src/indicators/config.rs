// =============================================================================
// Indicator configuration and identity
// =============================================================================
//
// An indicator is identified by its canonical key:
//   MA:<length>              simple moving average
//   BOLLINGER:<length>:<k>   Bollinger Bands
//   RSI:<period>             relative strength index
//
// The key is derived from the configuration, so two equal configurations
// always share one slot and a changed configuration is a different slot.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

pub const DEFAULT_BOLLINGER_LENGTH: usize = 20;
pub const DEFAULT_BOLLINGER_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Which derived series to build and with what parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorConfig {
    Sma { length: usize },
    Bollinger { length: usize, multiplier: f64 },
    Rsi { period: usize },
}

impl IndicatorConfig {
    pub fn sma(length: usize) -> Self {
        Self::Sma { length }
    }

    pub fn bollinger(length: usize, multiplier: f64) -> Self {
        Self::Bollinger { length, multiplier }
    }

    pub fn rsi(period: usize) -> Self {
        Self::Rsi { period }
    }

    /// Reject non-positive lengths, periods and multipliers.
    pub fn validate(&self) -> ChartResult<()> {
        match *self {
            Self::Sma { length } if length == 0 => {
                Err(ChartError::invalid_config("MA length must be positive"))
            }
            Self::Bollinger { length, .. } if length == 0 => {
                Err(ChartError::invalid_config("Bollinger length must be positive"))
            }
            Self::Bollinger { multiplier, .. } if !(multiplier.is_finite() && multiplier > 0.0) => {
                Err(ChartError::invalid_config(format!(
                    "Bollinger multiplier must be a positive number, got {multiplier}"
                )))
            }
            Self::Rsi { period } if period == 0 => {
                Err(ChartError::invalid_config("RSI period must be positive"))
            }
            _ => Ok(()),
        }
    }

    pub fn id(&self) -> IndicatorId {
        IndicatorId(match *self {
            Self::Sma { length } => format!("MA:{length}"),
            Self::Bollinger { length, multiplier } => format!("BOLLINGER:{length}:{multiplier}"),
            Self::Rsi { period } => format!("RSI:{period}"),
        })
    }

    /// Number of closes one value is computed from.
    pub fn window(&self) -> usize {
        self.warmup() + 1
    }

    /// Number of leading bars that can never carry a value.
    pub fn warmup(&self) -> usize {
        match *self {
            Self::Sma { length } | Self::Bollinger { length, .. } => length.saturating_sub(1),
            Self::Rsi { period } => period,
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self::bollinger(DEFAULT_BOLLINGER_LENGTH, DEFAULT_BOLLINGER_MULTIPLIER)
    }
}

// ---------------------------------------------------------------------------
// IndicatorId
// ---------------------------------------------------------------------------

/// Canonical key of an indicator slot, e.g. `MA:20`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorId(String);

impl IndicatorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of one line of this indicator, e.g. `BOLLINGER:20:2.upper`.
    pub fn line(&self, name: &str) -> String {
        format!("{}.{name}", self.0)
    }
}

impl std::fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IndicatorConfig {
    type Err = ChartError;

    /// Parse a canonical key back into a validated configuration.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let config = match parts.as_slice() {
            [kind, length] if kind.eq_ignore_ascii_case("MA") || kind.eq_ignore_ascii_case("SMA") => {
                Self::sma(parse_usize(length, s)?)
            }
            [kind, length, k] if kind.eq_ignore_ascii_case("BOLLINGER") => {
                let multiplier = k
                    .parse::<f64>()
                    .map_err(|_| ChartError::invalid_config(format!("bad multiplier in {s:?}")))?;
                Self::bollinger(parse_usize(length, s)?, multiplier)
            }
            [kind, period] if kind.eq_ignore_ascii_case("RSI") => Self::rsi(parse_usize(period, s)?),
            _ => {
                return Err(ChartError::invalid_config(format!(
                    "unknown indicator key {s:?}"
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }
}

impl FromStr for IndicatorId {
    type Err = ChartError;

    /// Canonicalize a user-supplied key (`ma:020` becomes `MA:20`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<IndicatorConfig>().map(|c| c.id())
    }
}

fn parse_usize(text: &str, key: &str) -> ChartResult<usize> {
    text.parse::<usize>()
        .map_err(|_| ChartError::invalid_config(format!("bad length in {key:?}")))
}
