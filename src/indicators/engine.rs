// =============================================================================
// Indicator Engine — derived series keyed by the primary time axis
// =============================================================================
//
// Turns an `IndicatorConfig` plus the primary bars into one or more named
// lines. Every line is keyed by the bars' own `TimeKey`s, one entry per bar,
// with `None` marking the warm-up window.
//
// Full builds and tail patches go through the same per-window arithmetic, so a
// series patched tick by tick equals one rebuilt from scratch.
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ChartResult;
use crate::indicators::bollinger::{bollinger_at, calculate_bollinger};
use crate::indicators::config::{IndicatorConfig, IndicatorId};
use crate::indicators::rsi::{rsi_at, rsi_series};
use crate::indicators::sma::sma_at;
use crate::indicators::window::simple_moving_average;
use crate::types::{Bar, TimeKey};

pub const BAND_UPPER: &str = "upper";
pub const BAND_MIDDLE: &str = "middle";
pub const BAND_LOWER: &str = "lower";

// ---------------------------------------------------------------------------
// DerivedSeries
// ---------------------------------------------------------------------------

/// One plotted line. Its key domain is always a subset of the source bars'.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    pub key: String,
    pub values: BTreeMap<TimeKey, Option<f64>>,
}

/// Plot-ready point of a derived line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: TimeKey,
    pub value: Option<f64>,
}

impl DerivedSeries {
    fn from_aligned(key: String, times: &[TimeKey], values: Vec<Option<f64>>) -> Self {
        Self {
            key,
            values: times.iter().copied().zip(values).collect(),
        }
    }

    /// Exact-key lookup. Absent keys and warm-up entries both read as `None`.
    pub fn value_at(&self, time: TimeKey) -> Option<f64> {
        self.values.get(&time).copied().flatten()
    }

    pub fn points(&self) -> Vec<SeriesPoint> {
        self.values
            .iter()
            .map(|(&time, &value)| SeriesPoint { time, value })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// IndicatorSeries
// ---------------------------------------------------------------------------

/// All lines produced by one indicator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub id: IndicatorId,
    pub config: IndicatorConfig,
    pub lines: Vec<DerivedSeries>,
}

impl IndicatorSeries {
    pub fn line(&self, key: &str) -> Option<&DerivedSeries> {
        self.lines.iter().find(|l| l.key == key)
    }

    pub fn line_keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.key.as_str())
    }

    /// Recompute the value at the last bar and store it under the last bar's
    /// key, appending or overwriting as needed.
    pub fn patch_tail(&mut self, bars: &[Bar]) {
        let Some(tail) = bars.last() else {
            return;
        };
        let time = tail.time;
        // Only the window ending at the tail feeds the recomputed value.
        let closes = trailing_closes(bars, self.config.window());
        let last = closes.len() - 1;

        match self.config {
            IndicatorConfig::Sma { length } => {
                let value = sma_at(&closes, length, last);
                if let Some(line) = self.lines.first_mut() {
                    line.values.insert(time, value);
                }
            }
            IndicatorConfig::Bollinger { length, multiplier } => {
                let point = bollinger_at(&closes, length, multiplier, last);
                for line in &mut self.lines {
                    let value = point.map(|p| match line_suffix(&line.key) {
                        BAND_UPPER => p.upper,
                        BAND_LOWER => p.lower,
                        _ => p.middle,
                    });
                    line.values.insert(time, value);
                }
            }
            IndicatorConfig::Rsi { period } => {
                let value = rsi_at(&closes, period, last);
                if let Some(line) = self.lines.first_mut() {
                    line.values.insert(time, value);
                }
            }
        }
    }
}

/// Closes of the last `count` bars (fewer when the series is shorter).
fn trailing_closes(bars: &[Bar], count: usize) -> Vec<f64> {
    let start = bars.len().saturating_sub(count);
    bars[start..].iter().map(|b| b.close).collect()
}

fn line_suffix(key: &str) -> &str {
    key.rsplit_once('.').map_or("", |(_, suffix)| suffix)
}

/// Build every line of `config` over `bars`.
///
/// # Errors
/// [`crate::ChartError::InvalidConfig`] when the configuration is invalid.
pub fn build_series(config: &IndicatorConfig, bars: &[Bar]) -> ChartResult<IndicatorSeries> {
    config.validate()?;

    let id = config.id();
    let times: Vec<TimeKey> = bars.iter().map(|b| b.time).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let lines = match *config {
        IndicatorConfig::Sma { length } => {
            let values = simple_moving_average(&closes, length)?;
            vec![DerivedSeries::from_aligned(id.to_string(), &times, values)]
        }
        IndicatorConfig::Bollinger { length, multiplier } => {
            let bands = calculate_bollinger(&closes, length, multiplier)?;
            vec![
                DerivedSeries::from_aligned(id.line(BAND_UPPER), &times, bands.upper),
                DerivedSeries::from_aligned(id.line(BAND_MIDDLE), &times, bands.middle),
                DerivedSeries::from_aligned(id.line(BAND_LOWER), &times, bands.lower),
            ]
        }
        IndicatorConfig::Rsi { period } => {
            let values = rsi_series(&closes, period);
            vec![DerivedSeries::from_aligned(id.to_string(), &times, values)]
        }
    };

    Ok(IndicatorSeries {
        id,
        config: *config,
        lines,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                time: TimeKey::from_epoch_seconds(i as i64 * 86_400),
                open: close,
                high: close,
                low: close,
                close,
            })
            .collect()
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|x| 100.0 + (x as f64 * 0.37).sin() * 5.0 + x as f64 * 0.1).collect()
    }

    #[test]
    fn sma_line_is_aligned_to_bars() {
        let b = bars(&wave(30));
        let s = build_series(&IndicatorConfig::sma(5), &b).unwrap();
        assert_eq!(s.lines.len(), 1);
        let line = &s.lines[0];
        assert_eq!(line.key, "MA:5");
        assert_eq!(line.len(), b.len());
        assert!(line.values.keys().zip(&b).all(|(k, bar)| *k == bar.time));
        assert_eq!(line.value_at(b[3].time), None);
        assert!(line.value_at(b[4].time).is_some());
    }

    #[test]
    fn bollinger_has_three_lines() {
        let b = bars(&wave(30));
        let s = build_series(&IndicatorConfig::bollinger(20, 2.0), &b).unwrap();
        let keys: Vec<&str> = s.line_keys().collect();
        assert_eq!(
            keys,
            vec!["BOLLINGER:20:2.upper", "BOLLINGER:20:2.middle", "BOLLINGER:20:2.lower"]
        );
        let t = b[25].time;
        let upper = s.line("BOLLINGER:20:2.upper").unwrap().value_at(t).unwrap();
        let lower = s.line("BOLLINGER:20:2.lower").unwrap().value_at(t).unwrap();
        assert!(upper >= lower);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let b = bars(&wave(5));
        assert!(build_series(&IndicatorConfig::rsi(0), &b).is_err());
    }

    #[test]
    fn tail_patch_equals_full_rebuild() {
        let closes = wave(40);
        for config in [
            IndicatorConfig::sma(7),
            IndicatorConfig::bollinger(10, 2.0),
            IndicatorConfig::rsi(14),
        ] {
            let mut b = bars(&closes[..30]);
            let mut incremental = build_series(&config, &b).unwrap();
            for i in 30..40 {
                b.push(bars(&closes[..=i])[i]);
                incremental.patch_tail(&b);
            }
            // Replace-last with a new close.
            let last = b.len() - 1;
            b[last].close += 3.0;
            incremental.patch_tail(&b);

            let full = build_series(&config, &b).unwrap();
            for (inc, fresh) in incremental.lines.iter().zip(&full.lines) {
                assert_eq!(inc.key, fresh.key);
                let a: Vec<Option<u64>> = inc.values.values().map(|v| v.map(f64::to_bits)).collect();
                let f: Vec<Option<u64>> = fresh.values.values().map(|v| v.map(f64::to_bits)).collect();
                assert_eq!(a, f, "{} diverged", inc.key);
            }
        }
    }

    #[test]
    fn tail_patch_reads_only_the_window() {
        // Corrupt history outside the window must not leak into the tail.
        let mut closes = wave(30);
        closes[0] = f64::NAN;
        let mut b = bars(&closes);
        let config = IndicatorConfig::sma(5);
        let mut series = build_series(&config, &b).unwrap();
        b[29].close += 1.0;
        series.patch_tail(&b);
        let full = build_series(&config, &b).unwrap();
        let t = b[29].time;
        assert_eq!(
            series.lines[0].value_at(t).map(f64::to_bits),
            full.lines[0].value_at(t).map(f64::to_bits)
        );
        assert_eq!(config.window(), 5);
        assert_eq!(IndicatorConfig::rsi(14).window(), 15);
    }

    #[test]
    fn tail_patch_short_history_stays_in_warmup() {
        let mut b = bars(&wave(3));
        let mut series = build_series(&IndicatorConfig::bollinger(20, 2.0), &b).unwrap();
        b.push(bars(&wave(4))[3]);
        series.patch_tail(&b);
        assert!(series.lines.iter().all(|l| l.len() == 4 && l.value_at(b[3].time).is_none()));
    }

    #[test]
    fn rebuild_is_deterministic() {
        let b = bars(&wave(50));
        let config = IndicatorConfig::bollinger(20, 2.0);
        assert_eq!(build_series(&config, &b).unwrap(), build_series(&config, &b).unwrap());
    }

    #[test]
    fn empty_bars_build_empty_lines() {
        let s = build_series(&IndicatorConfig::sma(3), &[]).unwrap();
        assert!(s.lines[0].is_empty());
    }
}
