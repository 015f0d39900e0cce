// =============================================================================
// Momentum / Relative-Strength Proxy
// =============================================================================
//
// Percentage change over three horizons of a trailing lookback window:
//   return = ((latest - start) / start) * 100
//
//   full    — start of the lookback window (~6 months of sessions)
//   half    — start of the back half of the window
//   recent  — start of the last ~22 sessions (window start if shorter)
//
// The score is a single-stock stand-in for a cross-sectional RS rating:
//   score = clamp(round(50 + return_full), 1, 99)
// It is not a percentile rank against a universe.

use serde::{Deserialize, Serialize};

/// About six months of trading sessions.
pub const DEFAULT_LOOKBACK: usize = 126;
/// About one month of trading sessions.
pub const DEFAULT_RECENT_WINDOW: usize = 22;
const NEUTRAL_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumScore {
    /// Whole number in `[1, 99]`, or `NaN` when the input was corrupt.
    pub score: f64,
    pub return_full: f64,
    pub return_half: f64,
    pub return_recent: f64,
}

impl MomentumScore {
    fn neutral() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            return_full: 0.0,
            return_half: 0.0,
            return_recent: 0.0,
        }
    }
}

/// Momentum score over the last `lookback` closes.
///
/// Fewer than two closes in the window yields score 50 with zero returns.
pub fn momentum_score(closes: &[f64], lookback: usize, recent_window: usize) -> MomentumScore {
    let start = closes.len().saturating_sub(lookback);
    let window = &closes[start..];
    if window.len() < 2 {
        return MomentumScore::neutral();
    }

    let latest = window[window.len() - 1];
    let return_full = pct_change(window[0], latest);
    let return_half = pct_change(window[window.len() / 2], latest);
    let return_recent = pct_change(window[window.len().saturating_sub(recent_window)], latest);

    // Corrupt input must not clamp into the 1..=99 range.
    let score = if return_full.is_finite() {
        (NEUTRAL_SCORE + return_full).round().clamp(1.0, 99.0)
    } else {
        f64::NAN
    };

    MomentumScore {
        score,
        return_full,
        return_half,
        return_recent,
    }
}

/// Rate of change from `base` to `latest` in percent. A zero base yields 0;
/// a non-finite price on either end yields NaN.
fn pct_change(base: f64, latest: f64) -> f64 {
    if !base.is_finite() || !latest.is_finite() {
        f64::NAN
    } else if base == 0.0 {
        0.0
    } else {
        (latest - base) / base * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_percent_scores_70() {
        let mut closes = vec![100.0; DEFAULT_LOOKBACK];
        *closes.last_mut().unwrap() = 120.0;
        let m = momentum_score(&closes, DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW);
        assert!((m.return_full - 20.0).abs() < 1e-10);
        assert_eq!(m.score, 70.0);
    }

    #[test]
    fn score_is_clamped() {
        let up = momentum_score(&[10.0, 100.0], DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW);
        assert_eq!(up.score, 99.0);
        let down = momentum_score(&[100.0, 10.0], DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW);
        assert_eq!(down.score, 1.0);
    }

    #[test]
    fn degenerate_input_is_neutral() {
        for closes in [&[][..], &[42.0][..]] {
            let m = momentum_score(closes, DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW);
            assert_eq!(m.score, 50.0);
            assert_eq!(m.return_full, 0.0);
            assert_eq!(m.return_half, 0.0);
            assert_eq!(m.return_recent, 0.0);
        }
    }

    #[test]
    fn only_lookback_window_is_used() {
        let mut closes = vec![1.0; 10];
        closes.extend([100.0, 110.0]);
        let m = momentum_score(&closes, 2, 22);
        assert!((m.return_full - 10.0).abs() < 1e-10);
        assert_eq!(m.score, 60.0);
    }

    #[test]
    fn horizons() {
        // 100 points: 0..=99 => window[0] = 100, window[50] = 150, window[78] = 178.
        let closes: Vec<f64> = (0..100).map(|x| 100.0 + x as f64).collect();
        let m = momentum_score(&closes, DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW);
        assert!((m.return_full - 99.0).abs() < 1e-10);
        assert!((m.return_half - (199.0 - 150.0) / 150.0 * 100.0).abs() < 1e-10);
        assert!((m.return_recent - (199.0 - 178.0) / 178.0 * 100.0).abs() < 1e-10);
    }

    #[test]
    fn short_history_recent_falls_back_to_window_start() {
        let closes = [100.0, 105.0, 110.0];
        let m = momentum_score(&closes, DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW);
        assert_eq!(m.return_recent, m.return_full);
    }

    #[test]
    fn nan_propagates() {
        let m = momentum_score(&[100.0, f64::NAN], DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW);
        assert!(m.return_full.is_nan());
        assert!(m.score.is_nan());
    }

    #[test]
    fn corrupt_close_after_zero_base_is_nan() {
        let m = momentum_score(&[0.0, f64::NAN], DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW);
        assert!(m.return_full.is_nan());
        assert!(m.return_recent.is_nan());
        assert!(m.score.is_nan());
    }

    #[test]
    fn infinite_close_is_not_clamped() {
        let m = momentum_score(&[100.0, f64::INFINITY], DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW);
        assert!(m.return_full.is_nan());
        assert!(m.score.is_nan());
    }

    #[test]
    fn zero_base_with_finite_latest_is_flat() {
        let m = momentum_score(&[0.0, 5.0], DEFAULT_LOOKBACK, DEFAULT_RECENT_WINDOW);
        assert_eq!(m.return_full, 0.0);
        assert_eq!(m.score, 50.0);
    }
}
