// =============================================================================
// Relative Strength Index (RSI) — simple-average variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Take the trailing `period + 1` closes (`period` deltas).
// Step 2 — Sum positive deltas into `gains` and |negative deltas| into `losses`.
// Step 3 — avg_gain = gains / period,  avg_loss = losses / period
// Step 4 — RS  = avg_gain / avg_loss   (100 when avg_loss is zero)
//          RSI = 100 - 100 / (1 + RS)
//
// Degenerate windows:
//   - non-finite close      => RSI NaN
//   - only gains            => RSI 100
//   - no movement at all    => RSI 50 (RS 1)
//   - history shorter than `period + 1` => RSI 50, neutral
//
// Thresholds:  RSI > 70 => OVERBOUGHT,  RSI < 30 => OVERSOLD.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Sentinel RS used when the window contains no losses.
pub const RS_NO_LOSS_SENTINEL: f64 = 100.0;
pub const OVERBOUGHT_THRESHOLD: f64 = 70.0;
pub const OVERSOLD_THRESHOLD: f64 = 30.0;
const NEUTRAL_RSI: f64 = 50.0;
/// RS of a window with no movement; consistent with RSI 50.
const FLAT_RS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSignal {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiSignal {
    /// Label an RSI value. `NaN` is labelled neutral; the value itself still
    /// carries the corruption.
    pub fn classify(rsi: f64) -> Self {
        if rsi < OVERSOLD_THRESHOLD {
            Self::Oversold
        } else if rsi > OVERBOUGHT_THRESHOLD {
            Self::Overbought
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for RsiSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oversold => write!(f, "oversold"),
            Self::Neutral => write!(f, "neutral"),
            Self::Overbought => write!(f, "overbought"),
        }
    }
}

/// RSI at the latest close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiReading {
    pub value: f64,
    pub signal: RsiSignal,
    pub avg_gain: f64,
    pub avg_loss: f64,
    /// `avg_gain / avg_loss`; `RS_NO_LOSS_SENTINEL` for an all-gain window,
    /// 1 for a flat one, NaN for a corrupt one.
    pub rs: f64,
    /// `false` when history was too short and the neutral default was used.
    pub sufficient_data: bool,
}

impl RsiReading {
    fn neutral_default() -> Self {
        Self {
            value: NEUTRAL_RSI,
            signal: RsiSignal::Neutral,
            avg_gain: 0.0,
            avg_loss: 0.0,
            rs: 0.0,
            sufficient_data: false,
        }
    }
}

/// RSI reading from the trailing `period + 1` closes.
///
/// Never fails: `period == 0` or a short history yields the neutral default.
pub fn calculate_rsi(closes: &[f64], period: usize) -> RsiReading {
    if period == 0 || closes.len() < period + 1 {
        return RsiReading::neutral_default();
    }
    rsi_over_window(&closes[closes.len() - period - 1..], period)
}

/// RSI value at `index`, from the `period + 1` closes ending there.
/// `None` while fewer than `period + 1` closes are available.
pub fn rsi_at(closes: &[f64], period: usize, index: usize) -> Option<f64> {
    if period == 0 || index >= closes.len() || index < period {
        return None;
    }
    Some(rsi_over_window(&closes[index - period..=index], period).value)
}

/// Full RSI series, index-aligned with `closes`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..closes.len()).map(|i| rsi_at(closes, period, i)).collect()
}

// =============================================================================
// Internal helpers
// =============================================================================

fn rsi_over_window(window: &[f64], period: usize) -> RsiReading {
    let (gains, losses) = window.windows(2).map(|w| w[1] - w[0]).fold(
        (0.0_f64, 0.0_f64),
        |(g, l), d| {
            if d > 0.0 {
                (g + d, l)
            } else if d < 0.0 {
                (g, l - d)
            } else if d.is_nan() {
                (f64::NAN, f64::NAN)
            } else {
                (g, l)
            }
        },
    );

    let period_f = period as f64;
    let avg_gain = gains / period_f;
    let avg_loss = losses / period_f;

    let (rs, value) = if !avg_gain.is_finite() || !avg_loss.is_finite() {
        (f64::NAN, f64::NAN)
    } else if avg_loss == 0.0 && avg_gain == 0.0 {
        (FLAT_RS, NEUTRAL_RSI)
    } else if avg_loss == 0.0 {
        (RS_NO_LOSS_SENTINEL, 100.0)
    } else {
        let rs = avg_gain / avg_loss;
        (rs, 100.0 - 100.0 / (1.0 + rs))
    };

    RsiReading {
        value,
        signal: RsiSignal::classify(value),
        avg_gain,
        avg_loss,
        rs,
        sufficient_data: true,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_is_neutral_default() {
        let reading = calculate_rsi(&(1..=14).map(|x| x as f64).collect::<Vec<_>>(), 14);
        assert_eq!(reading.value, 50.0);
        assert_eq!(reading.signal, RsiSignal::Neutral);
        assert!(!reading.sufficient_data);
        assert_eq!(calculate_rsi(&[], 14).value, 50.0);
        assert_eq!(calculate_rsi(&[1.0, 2.0], 0).signal, RsiSignal::Neutral);
    }

    #[test]
    fn all_gains_is_100() {
        let closes: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        let reading = calculate_rsi(&closes, 14);
        assert_eq!(reading.avg_loss, 0.0);
        assert_eq!(reading.rs, RS_NO_LOSS_SENTINEL);
        assert_eq!(reading.value, 100.0);
        assert_eq!(reading.signal, RsiSignal::Overbought);
    }

    #[test]
    fn all_losses_is_zero() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let reading = calculate_rsi(&closes, 14);
        assert!(reading.value.abs() < 1e-10);
        assert_eq!(reading.signal, RsiSignal::Oversold);
    }

    #[test]
    fn flat_market_is_neutral() {
        let reading = calculate_rsi(&[100.0; 30], 14);
        assert_eq!(reading.value, 50.0);
        assert_eq!(reading.signal, RsiSignal::Neutral);
        assert!(reading.sufficient_data);
    }

    #[test]
    fn uses_only_trailing_window() {
        // Early crash is outside the 3-delta window; the last three moves are
        // +1, -1, +2 => avg_gain 1, avg_loss 1/3 => RS 3 => RSI 75.
        let closes = [100.0, 50.0, 10.0, 11.0, 10.0, 12.0];
        let reading = calculate_rsi(&closes, 3);
        assert!((reading.rs - 3.0).abs() < 1e-10);
        assert!((reading.value - 75.0).abs() < 1e-10);
    }

    #[test]
    fn range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        for v in rsi_series(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }

    #[test]
    fn series_warmup_and_latest_agree() {
        let closes: Vec<f64> = (0..25).map(|x| 50.0 + ((x * 7) % 5) as f64).collect();
        let series = rsi_series(&closes, 14);
        assert!(series[..14].iter().all(Option::is_none));
        assert!(series[14].is_some());
        assert_eq!(series[24], Some(calculate_rsi(&closes, 14).value));
    }

    #[test]
    fn nan_propagates() {
        let mut closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        closes[18] = f64::NAN;
        assert!(calculate_rsi(&closes, 14).value.is_nan());
    }

    #[test]
    fn infinite_close_is_nan_not_overbought() {
        let mut closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        closes.push(f64::INFINITY);
        let reading = calculate_rsi(&closes, 14);
        assert!(reading.value.is_nan());
        assert!(reading.rs.is_nan());
        assert_eq!(reading.signal, RsiSignal::Neutral);
        assert!(rsi_series(&closes, 14)[14].unwrap().is_nan());
    }

    #[test]
    fn flat_window_rs_matches_value() {
        let reading = calculate_rsi(&[100.0; 15], 14);
        assert_eq!(reading.rs, 1.0);
        assert_eq!(reading.value, 100.0 - 100.0 / (1.0 + reading.rs));
    }

    #[test]
    fn classification_thresholds() {
        assert_eq!(RsiSignal::classify(29.9), RsiSignal::Oversold);
        assert_eq!(RsiSignal::classify(30.0), RsiSignal::Neutral);
        assert_eq!(RsiSignal::classify(70.0), RsiSignal::Neutral);
        assert_eq!(RsiSignal::classify(70.1), RsiSignal::Overbought);
    }
}
