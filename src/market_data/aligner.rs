// =============================================================================
// Time Series Aligner
// =============================================================================
//
// Canonicalizes the time representations delivered by the historical and live
// data collaborators into the single `TimeKey` axis shared by every series
// derived from one source.
//
// Accepted inbound forms:
//   - "YYYY-MM-DD" calendar-date strings
//   - epoch-seconds integers
//   - business-day objects { year, month, day }
//
// The aligner never reorders. A key smaller than its predecessor rejects the
// whole input; adjacent equal keys collapse with the later bar winning, the
// same way an in-progress candle is replaced by its newer version.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChartError, ChartResult};
use crate::types::{Bar, TimeKey, VolumeBar};

// ---------------------------------------------------------------------------
// Inbound types
// ---------------------------------------------------------------------------

/// Time value as delivered by a data collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    Epoch(i64),
    Date(String),
    BusinessDay { year: i32, month: u32, day: u32 },
}

impl From<i64> for RawTime {
    fn from(secs: i64) -> Self {
        Self::Epoch(secs)
    }
}

impl From<&str> for RawTime {
    fn from(date: &str) -> Self {
        Self::Date(date.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub time: RawTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVolume {
    pub time: RawTime,
    pub value: f64,
}

/// How epoch instants are mapped onto the key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Epoch instants are truncated to their UTC day, so every representation
    /// of one calendar day yields the same key.
    #[default]
    Daily,
    /// Epoch instants are kept to the second.
    Intraday,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a single time value.
pub fn normalize_time(raw: &RawTime, granularity: Granularity) -> ChartResult<TimeKey> {
    match raw {
        RawTime::Epoch(secs) => {
            let key = TimeKey::from_epoch_seconds(*secs);
            Ok(match granularity {
                Granularity::Daily => key.start_of_day(),
                Granularity::Intraday => key,
            })
        }
        RawTime::Date(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(TimeKey::from_date)
            .map_err(|e| ChartError::malformed(format!("unparseable date {text:?}: {e}"))),
        RawTime::BusinessDay { year, month, day } => NaiveDate::from_ymd_opt(*year, *month, *day)
            .map(TimeKey::from_date)
            .ok_or_else(|| {
                ChartError::malformed(format!("invalid business day {year}-{month}-{day}"))
            }),
    }
}

/// Normalize a bar list into a strictly ascending series on the canonical axis.
///
/// # Errors
/// [`ChartError::MalformedSeries`] when a time cannot be parsed or a key is
/// smaller than the previous one.
pub fn align_bars(raw: &[RawBar], granularity: Granularity) -> ChartResult<Vec<Bar>> {
    let mut bars: Vec<Bar> = Vec::with_capacity(raw.len());
    let mut collapsed = 0usize;

    for (i, item) in raw.iter().enumerate() {
        let time = normalize_time(&item.time, granularity)?;
        let bar = Bar {
            time,
            open: item.open,
            high: item.high,
            low: item.low,
            close: item.close,
        };

        match bars.last_mut() {
            Some(prev) if time < prev.time => {
                return Err(ChartError::malformed(format!(
                    "bar {i} at {time} precedes bar {} at {}",
                    i - 1,
                    prev.time
                )));
            }
            Some(prev) if time == prev.time => {
                *prev = bar;
                collapsed += 1;
            }
            _ => bars.push(bar),
        }
    }

    if collapsed > 0 {
        debug!(collapsed, kept = bars.len(), "collapsed duplicate time keys");
    }

    Ok(bars)
}

/// Pair volume points with the aligned bars of the same series.
///
/// Volume points without a bar at the same key are dropped so that the volume
/// domain stays a subset of the bar domain. The same ordering rule as
/// [`align_bars`] applies.
pub fn pair_volume(
    bars: &[Bar],
    raw: &[RawVolume],
    granularity: Granularity,
) -> ChartResult<Vec<VolumeBar>> {
    let mut out: Vec<VolumeBar> = Vec::with_capacity(raw.len().min(bars.len()));
    let mut prev: Option<TimeKey> = None;
    let mut dropped = 0usize;

    for (i, item) in raw.iter().enumerate() {
        let time = normalize_time(&item.time, granularity)?;
        if let Some(p) = prev {
            if time < p {
                return Err(ChartError::malformed(format!(
                    "volume point {i} at {time} precedes {p}"
                )));
            }
        }
        prev = Some(time);

        let Ok(idx) = bars.binary_search_by_key(&time, |b| b.time) else {
            dropped += 1;
            continue;
        };
        let vol = VolumeBar::paired(&bars[idx], item.value);
        match out.last_mut() {
            Some(last) if last.time == time => *last = vol,
            _ => out.push(vol),
        }
    }

    if dropped > 0 {
        debug!(dropped, "volume points without a matching bar dropped");
    }

    Ok(out)
}
