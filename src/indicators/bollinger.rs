// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// of the same trailing window.
//
// Wherever the middle band is still warming up, both outer bands are `None`.

use serde::{Deserialize, Serialize};

use crate::error::ChartResult;
use crate::indicators::window::{population_stddev, simple_moving_average, trailing, window_mean, window_stddev};

/// Full band series, index-aligned with the input closes.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Band values at one index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerPoint {
    /// Band width normalised by the middle band, in percent.
    pub fn width(&self) -> Option<f64> {
        if self.middle == 0.0 {
            return None;
        }
        Some((self.upper - self.lower) / self.middle * 100.0)
    }
}

/// Where the latest close sits relative to the bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPosition {
    Above,
    Middle,
    Below,
    InsufficientData,
}

impl std::fmt::Display for BandPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Above => write!(f, "above"),
            Self::Middle => write!(f, "middle"),
            Self::Below => write!(f, "below"),
            Self::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

/// Compute the band series for `closes`.
///
/// # Errors
/// [`crate::ChartError::InvalidConfig`] when `length == 0`.
pub fn calculate_bollinger(closes: &[f64], length: usize, multiplier: f64) -> ChartResult<BollingerSeries> {
    let middle = simple_moving_average(closes, length)?;
    let stddev = population_stddev(closes, length, &middle)?;

    let (upper, lower) = middle
        .iter()
        .zip(&stddev)
        .map(|(m, sd)| match (m, sd) {
            (Some(m), Some(sd)) => (Some(m + multiplier * sd), Some(m - multiplier * sd)),
            _ => (None, None),
        })
        .unzip();

    Ok(BollingerSeries { upper, middle, lower })
}

/// Band values at a single index, evaluated from its own window.
pub fn bollinger_at(closes: &[f64], length: usize, multiplier: f64, index: usize) -> Option<BollingerPoint> {
    let window = trailing(closes, length, index)?;
    let middle = window_mean(window);
    let sd = window_stddev(window, middle);
    Some(BollingerPoint {
        upper: middle + multiplier * sd,
        middle,
        lower: middle - multiplier * sd,
    })
}

/// Classify `close` against the bands at the same bar.
///
/// `None` bands mean the window has not filled yet and the position is
/// reported as [`BandPosition::InsufficientData`].
pub fn band_position(close: f64, bands: Option<&BollingerPoint>) -> BandPosition {
    match bands {
        None => BandPosition::InsufficientData,
        Some(b) if close > b.upper => BandPosition::Above,
        Some(b) if close < b.lower => BandPosition::Below,
        Some(_) => BandPosition::Middle,
    }
}

/// Bands and position at the latest close.
pub fn latest_bollinger(closes: &[f64], length: usize, multiplier: f64) -> (Option<BollingerPoint>, BandPosition) {
    let Some(last) = closes.len().checked_sub(1) else {
        return (None, BandPosition::InsufficientData);
    };
    let point = bollinger_at(closes, length, multiplier, last);
    let position = band_position(closes[last], point.as_ref());
    (point, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_is_sma() {
        let closes: Vec<f64> = (0..50).map(|x| ((x * 13) % 7) as f64 + x as f64).collect();
        let bb = calculate_bollinger(&closes, 20, 2.0).unwrap();
        let sma = simple_moving_average(&closes, 20).unwrap();
        assert_eq!(bb.middle, sma);
    }

    #[test]
    fn known_three_point_bands() {
        let bb = calculate_bollinger(&[10.0, 11.0, 12.0], 3, 2.0).unwrap();
        assert!(bb.upper[1].is_none() && bb.lower[1].is_none());
        assert!((bb.upper[2].unwrap() - 12.633).abs() < 1e-3);
        assert!((bb.lower[2].unwrap() - 9.367).abs() < 1e-3);
    }

    #[test]
    fn flat_window_collapses_bands() {
        let bb = calculate_bollinger(&[100.0; 20], 20, 2.0).unwrap();
        assert_eq!(bb.upper[19], Some(100.0));
        assert_eq!(bb.lower[19], Some(100.0));
        let point = bollinger_at(&[100.0; 20], 20, 2.0, 19).unwrap();
        assert_eq!(point.width(), Some(0.0));
    }

    #[test]
    fn pointwise_matches_series() {
        let closes: Vec<f64> = (0..40).map(|x| (x as f64).sqrt() * 3.0).collect();
        let bb = calculate_bollinger(&closes, 10, 1.5).unwrap();
        for i in 0..closes.len() {
            let p = bollinger_at(&closes, 10, 1.5, i);
            assert_eq!(p.map(|p| p.upper.to_bits()), bb.upper[i].map(f64::to_bits));
            assert_eq!(p.map(|p| p.lower.to_bits()), bb.lower[i].map(f64::to_bits));
        }
    }

    #[test]
    fn position_classification() {
        let bands = BollingerPoint {
            upper: 12.0,
            middle: 11.0,
            lower: 10.0,
        };
        assert_eq!(band_position(12.5, Some(&bands)), BandPosition::Above);
        assert_eq!(band_position(9.5, Some(&bands)), BandPosition::Below);
        assert_eq!(band_position(12.0, Some(&bands)), BandPosition::Middle);
        assert_eq!(band_position(11.0, None), BandPosition::InsufficientData);
    }

    #[test]
    fn latest_insufficient_data() {
        let (point, position) = latest_bollinger(&[1.0, 2.0, 3.0], 20, 2.0);
        assert!(point.is_none());
        assert_eq!(position, BandPosition::InsufficientData);
        assert_eq!(latest_bollinger(&[], 20, 2.0).1, BandPosition::InsufficientData);
    }

    #[test]
    fn latest_breakout_above() {
        let mut closes = vec![100.0; 19];
        closes.push(130.0);
        let (_, position) = latest_bollinger(&closes, 20, 2.0);
        assert_eq!(position, BandPosition::Above);
    }
}
