use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{Bar, TimeKey, VolumeBar};

/// Placeholder shown for a missing reading. A missing value is never drawn
/// as zero.
pub const NO_DATA: &str = "—";

/// Synchronized values of every active line at one hovered time point.
///
/// `time == None` means the pointer left the surface; a hovered gap has a
/// `time` but no `candle`.
///
/// On the wire `series_values` is JSON, which has no NaN: a corrupt value and
/// a warm-up slot both serialize as `null`. `legend` keeps them apart (`NaN`
/// versus [`NO_DATA`]), so clients that must detect corruption read it there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrosshairSample {
    pub time: Option<TimeKey>,
    pub candle: Option<Bar>,
    pub volume: Option<VolumeBar>,
    pub series_values: BTreeMap<String, Option<f64>>,
}

impl CrosshairSample {
    /// Sample for "no hover": every listed line is present and empty.
    pub fn empty<'a>(line_keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            time: None,
            candle: None,
            volume: None,
            series_values: line_keys.into_iter().map(|k| (k.to_string(), None)).collect(),
        }
    }

    pub fn is_hovering(&self) -> bool {
        self.time.is_some()
    }

    pub fn value(&self, line_key: &str) -> Option<f64> {
        self.series_values.get(line_key).copied().flatten()
    }

    /// Display strings for a legend, `NO_DATA` where a slot is empty.
    pub fn legend(&self, decimals: usize) -> BTreeMap<String, String> {
        self.series_values
            .iter()
            .map(|(k, v)| (k.clone(), format_value(*v, decimals)))
            .collect()
    }
}

/// Format an optional reading for display.
pub fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        Some(v) => format!("{v}"),
        None => NO_DATA.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_lists_keys() {
        let sample = CrosshairSample::empty(["MA:20", "RSI:14"]);
        assert!(!sample.is_hovering());
        assert_eq!(sample.series_values.len(), 2);
        assert!(sample.series_values.values().all(Option::is_none));
    }

    #[test]
    fn none_formats_as_dash_not_zero() {
        assert_eq!(format_value(None, 2), NO_DATA);
        assert_eq!(format_value(Some(0.0), 2), "0.00");
        assert_eq!(format_value(Some(12.3456), 2), "12.35");
        assert_eq!(format_value(Some(f64::NAN), 2), "NaN");
    }

    #[test]
    fn corrupt_value_is_null_on_wire_but_nan_in_legend() {
        let mut sample = CrosshairSample::empty(["MA:20", "RSI:14"]);
        sample.series_values.insert("RSI:14".into(), Some(f64::NAN));
        let json = serde_json::to_value(&sample).unwrap();
        assert!(json["series_values"]["MA:20"].is_null());
        assert!(json["series_values"]["RSI:14"].is_null());
        let legend = sample.legend(2);
        assert_eq!(legend["MA:20"], NO_DATA);
        assert_eq!(legend["RSI:14"], "NaN");
    }

    #[test]
    fn legend_uses_placeholder() {
        let mut sample = CrosshairSample::empty(["MA:20"]);
        sample.series_values.insert("RSI:14".into(), Some(55.0));
        let legend = sample.legend(1);
        assert_eq!(legend["MA:20"], NO_DATA);
        assert_eq!(legend["RSI:14"], "55.0");
    }
}
