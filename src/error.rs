//! Structural errors of the chart core.
//!
//! Numeric degeneracy (short history, zero variance, zero average loss) is not
//! an error; it is carried in the data as `None` or a neutral default.

use thiserror::Error;

use crate::types::TimeKey;

/// Errors returned to the immediate caller. None of them leave partially
/// applied state behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    /// Input bars are out of order after time normalization, or a time value
    /// could not be parsed.
    #[error("malformed series: {0}")]
    MalformedSeries(String),

    /// Non-positive length/period or a non-positive multiplier.
    #[error("invalid indicator config: {0}")]
    InvalidConfig(String),

    /// A live patch that does not extend the current primary series.
    #[error("stale update at {time}: {reason}")]
    StaleUpdate {
        /// Time key carried by the rejected patch.
        time: TimeKey,
        /// Why the patch was rejected.
        reason: String,
    },
}

impl ChartError {
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        ChartError::MalformedSeries(msg.into())
    }

    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        ChartError::InvalidConfig(msg.into())
    }

    #[must_use]
    pub fn stale(time: TimeKey, reason: impl Into<String>) -> Self {
        ChartError::StaleUpdate {
            time,
            reason: reason.into(),
        }
    }
}

pub type ChartResult<T> = Result<T, ChartError>;
