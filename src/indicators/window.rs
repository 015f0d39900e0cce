// =============================================================================
// Window Statistics — trailing mean and population standard deviation
// =============================================================================
//
// Every value is a direct evaluation over its own trailing window; there is no
// running sum that gets corrected as the window slides. A value therefore
// depends only on the `length` inputs that end at its index, and a tail patch
// reproduces a full rebuild bit-for-bit.
//
// Output index `i` is `None` while fewer than `length` samples are available.
// =============================================================================

use crate::error::{ChartError, ChartResult};

/// Arithmetic mean of a window, summed left to right.
pub fn window_mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

/// Population standard deviation of a window around `mean` (divides by the
/// window length, not length - 1).
pub fn window_stddev(window: &[f64], mean: f64) -> f64 {
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / window.len() as f64;
    variance.sqrt()
}

/// Trailing window of `length` samples ending at `index`, if complete.
pub fn trailing(values: &[f64], length: usize, index: usize) -> Option<&[f64]> {
    if length == 0 || index >= values.len() || index + 1 < length {
        return None;
    }
    Some(&values[index + 1 - length..=index])
}

/// Simple moving average with the same length as `values`.
///
/// # Errors
/// [`ChartError::InvalidConfig`] when `length == 0`.
pub fn simple_moving_average(values: &[f64], length: usize) -> ChartResult<Vec<Option<f64>>> {
    ensure_length(length)?;
    Ok((0..values.len())
        .map(|i| trailing(values, length, i).map(window_mean))
        .collect())
}

/// Population standard deviation over the same windows that produced
/// `mean_series`.
///
/// # Errors
/// [`ChartError::InvalidConfig`] when `length == 0`.
pub fn population_stddev(
    values: &[f64],
    length: usize,
    mean_series: &[Option<f64>],
) -> ChartResult<Vec<Option<f64>>> {
    ensure_length(length)?;
    Ok((0..values.len())
        .map(|i| {
            let mean = mean_series.get(i).copied().flatten()?;
            trailing(values, length, i).map(|w| window_stddev(w, mean))
        })
        .collect())
}

fn ensure_length(length: usize) -> ChartResult<()> {
    if length == 0 {
        return Err(ChartError::invalid_config("window length must be positive"));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup_is_none_then_mean() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sma = simple_moving_average(&values, 3).unwrap();
        assert_eq!(sma.len(), 5);
        assert!(sma[0].is_none());
        assert!(sma[1].is_none());
        assert!((sma[2].unwrap() - 2.0).abs() < 1e-10);
        assert!((sma[3].unwrap() - 3.0).abs() < 1e-10);
        assert!((sma[4].unwrap() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn sma_matches_definition_everywhere() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 37) % 11) as f64 + 0.25 * i as f64).collect();
        for length in [1, 2, 5, 13, 40, 41] {
            let sma = simple_moving_average(&values, length).unwrap();
            assert_eq!(sma.len(), values.len());
            for (i, v) in sma.iter().enumerate() {
                if i + 1 < length {
                    assert!(v.is_none());
                } else {
                    let window = &values[i + 1 - length..=i];
                    let expected = window.iter().sum::<f64>() / length as f64;
                    assert_eq!(v.unwrap().to_bits(), expected.to_bits());
                }
            }
        }
    }

    #[test]
    fn sma_zero_length_is_invalid() {
        assert!(matches!(
            simple_moving_average(&[1.0], 0),
            Err(ChartError::InvalidConfig(_))
        ));
    }

    #[test]
    fn sma_shorter_input_is_all_none() {
        let sma = simple_moving_average(&[1.0, 2.0], 5).unwrap();
        assert!(sma.iter().all(Option::is_none));
    }

    #[test]
    fn stddev_population_formula() {
        let values = [10.0, 11.0, 12.0];
        let mean = simple_moving_average(&values, 3).unwrap();
        let sd = population_stddev(&values, 3, &mean).unwrap();
        assert!(sd[0].is_none() && sd[1].is_none());
        assert!((sd[2].unwrap() - (2.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((sd[2].unwrap() - 0.8165).abs() < 1e-4);
    }

    #[test]
    fn stddev_zero_variance() {
        let values = [5.0; 6];
        let mean = simple_moving_average(&values, 4).unwrap();
        let sd = population_stddev(&values, 4, &mean).unwrap();
        assert_eq!(sd[5], Some(0.0));
    }

    #[test]
    fn nan_propagates() {
        let values = [1.0, f64::NAN, 3.0, 4.0];
        let sma = simple_moving_average(&values, 2).unwrap();
        assert!(sma[1].unwrap().is_nan());
        assert!(sma[2].unwrap().is_nan());
        assert!((sma[3].unwrap() - 3.5).abs() < 1e-10);
    }
}
