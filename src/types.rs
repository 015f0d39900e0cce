// =============================================================================
// Shared types used across the Aurora chart core
// =============================================================================

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

// =============================================================================
// TimeKey
// =============================================================================

/// Canonical point on the shared time axis: UTC epoch seconds.
///
/// Calendar dates map to UTC midnight, so a date string and the epoch instant
/// of the same midnight produce the identical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeKey(i64);

impl TimeKey {
    pub fn from_epoch_seconds(secs: i64) -> Self {
        Self(secs)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        let days = i64::from(date.num_days_from_ce()) - EPOCH_DAYS_FROM_CE;
        Self(days * SECONDS_PER_DAY)
    }

    /// Key of the UTC day containing this instant.
    pub fn start_of_day(self) -> Self {
        Self(self.0.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY)
    }

    pub fn epoch_seconds(self) -> i64 {
        self.0
    }

    pub fn is_midnight(self) -> bool {
        self.0.rem_euclid(SECONDS_PER_DAY) == 0
    }
}

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const EPOCH_DAYS_FROM_CE: i64 = 719_163;

impl std::fmt::Display for TimeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match DateTime::from_timestamp(self.0, 0) {
            Some(dt) if self.is_midnight() => write!(f, "{}", dt.format("%Y-%m-%d")),
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}", self.0),
        }
    }
}

// =============================================================================
// Bars
// =============================================================================

/// One OHLC price observation on the canonical time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: TimeKey,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// Up/down tag of a volume bar, taken from its paired price bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeColor {
    Up,
    Down,
}

impl std::fmt::Display for VolumeColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBar {
    pub time: TimeKey,
    pub value: f64,
    pub color: VolumeColor,
}

impl VolumeBar {
    pub fn paired(bar: &Bar, value: f64) -> Self {
        let color = if bar.is_up() {
            VolumeColor::Up
        } else {
            VolumeColor::Down
        };
        Self {
            time: bar.time,
            value,
            color,
        }
    }
}
