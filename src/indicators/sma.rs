// =============================================================================
// Simple Moving Averages
// =============================================================================
//
// One series per requested length, all read from the same close array and
// computed independently of one another.

use crate::error::ChartResult;
use crate::indicators::window::{simple_moving_average, trailing, window_mean};

/// Moving averages for every length in `lengths`, in request order.
///
/// Duplicate lengths yield duplicate entries; the caller keys them.
///
/// # Errors
/// [`crate::ChartError::InvalidConfig`] when any length is zero; nothing is
/// computed in that case.
pub fn moving_averages(closes: &[f64], lengths: &[usize]) -> ChartResult<Vec<(usize, Vec<Option<f64>>)>> {
    lengths
        .iter()
        .map(|&length| simple_moving_average(closes, length).map(|series| (length, series)))
        .collect()
}

/// Moving average value at a single index, evaluated from its own window.
pub fn sma_at(closes: &[f64], length: usize, index: usize) -> Option<f64> {
    trailing(closes, length, index).map(window_mean)
}

/// Latest moving average value, `None` during warm-up.
pub fn latest_sma(closes: &[f64], length: usize) -> Option<f64> {
    closes.len().checked_sub(1).and_then(|i| sma_at(closes, length, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_series_per_length() {
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let out = moving_averages(&closes, &[2, 5]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, 2);
        assert_eq!(out[1].0, 5);
        assert_eq!(out[0].1.iter().filter(|v| v.is_none()).count(), 1);
        assert_eq!(out[1].1.iter().filter(|v| v.is_none()).count(), 4);
        assert!((out[1].1[9].unwrap() - 8.0).abs() < 1e-10);
    }

    #[test]
    fn zero_length_fails_whole_request() {
        assert!(moving_averages(&[1.0, 2.0], &[2, 0]).is_err());
    }

    #[test]
    fn pointwise_matches_series() {
        let closes: Vec<f64> = (0..30).map(|x| (x as f64 * 0.7).sin() * 10.0 + 50.0).collect();
        let series = simple_moving_average(&closes, 7).unwrap();
        for (i, v) in series.iter().enumerate() {
            assert_eq!(sma_at(&closes, 7, i).map(f64::to_bits), v.map(f64::to_bits));
        }
    }

    #[test]
    fn latest_during_warmup() {
        assert_eq!(latest_sma(&[1.0, 2.0], 3), None);
        assert_eq!(latest_sma(&[], 3), None);
        assert_eq!(latest_sma(&[1.0, 2.0, 3.0], 3), Some(2.0));
    }
}
