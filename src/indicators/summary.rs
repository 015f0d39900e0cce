// =============================================================================
// Technical Summary — latest-bar readings for badges and status chips
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::indicators::bollinger::{latest_bollinger, BandPosition, BollingerPoint};
use crate::indicators::momentum::{momentum_score, MomentumScore};
use crate::indicators::rsi::{calculate_rsi, RsiReading};
use crate::indicators::sma::latest_sma;
use crate::types::{Bar, TimeKey};

/// Parameters of the summary; normally taken from the chart configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryParams {
    pub ma_lengths: Vec<usize>,
    pub bollinger_length: usize,
    pub bollinger_multiplier: f64,
    pub rsi_period: usize,
    pub momentum_lookback: usize,
    pub momentum_recent_window: usize,
}

/// Latest moving average and whether the close sits above it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovingAverageReading {
    pub length: usize,
    pub value: Option<f64>,
    pub close_above: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalSummary {
    pub time: Option<TimeKey>,
    pub close: Option<f64>,
    pub moving_averages: Vec<MovingAverageReading>,
    pub bollinger: Option<BollingerPoint>,
    pub band_position: BandPosition,
    pub rsi: RsiReading,
    pub momentum: MomentumScore,
}

/// Summarize the latest bar of `bars`.
pub fn summarize(bars: &[Bar], params: &SummaryParams) -> TechnicalSummary {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let close = closes.last().copied();

    let moving_averages = params
        .ma_lengths
        .iter()
        .map(|&length| {
            let value = if length == 0 { None } else { latest_sma(&closes, length) };
            MovingAverageReading {
                length,
                value,
                close_above: close.zip(value).map(|(c, v)| c > v),
            }
        })
        .collect();

    let (bollinger, band_position) = if params.bollinger_length == 0 {
        (None, BandPosition::InsufficientData)
    } else {
        latest_bollinger(&closes, params.bollinger_length, params.bollinger_multiplier)
    };
    let rsi = calculate_rsi(&closes, params.rsi_period);
    let momentum = momentum_score(&closes, params.momentum_lookback, params.momentum_recent_window);

    debug!(
        bars = bars.len(),
        band_position = %band_position,
        rsi = rsi.value,
        rsi_signal = %rsi.signal,
        momentum_score = momentum.score,
        "technical summary computed"
    );

    TechnicalSummary {
        time: bars.last().map(|b| b.time),
        close,
        moving_averages,
        bollinger,
        band_position,
        rsi,
        momentum,
    }
}
