// =============================================================================
// Chart Sync Coordinator
// =============================================================================
//
// Owns one primary bar series and a table of indicator slots keyed by
// `IndicatorId`. Answers crosshair queries by exact-key lookup across the
// candle, its volume, and every active derived line.
//
// Recomputation happens only when:
//   - the primary series is replaced (active slots rebuild now, hidden slots
//     on their next access),
//   - a live tick lands (active slots patch their tail, hidden slots are
//     invalidated),
//   - an indicator's own configuration changes.
// Visibility toggles never touch stored values.
//
// Access is single-threaded; a host sharing a coordinator must serialize
// mutations itself.
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chart::crosshair::CrosshairSample;
use crate::error::ChartResult;
use crate::indicators::engine::{build_series, IndicatorSeries};
use crate::indicators::summary::{summarize, SummaryParams, TechnicalSummary};
use crate::indicators::{IndicatorConfig, IndicatorId};
use crate::market_data::bar_series::{BarSeries, LiveApplied, LiveUpdate};
use crate::types::{Bar, TimeKey, VolumeBar};

/// Result of [`ChartSyncCoordinator::enable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnableOutcome {
    /// Values were computed.
    Built,
    /// A hidden indicator was shown again with its stored values.
    Restored,
    /// Already active with current values; nothing happened.
    Unchanged,
}

#[derive(Debug, Clone)]
struct IndicatorSlot {
    config: IndicatorConfig,
    active: bool,
    /// `None` once invalidated by a primary change.
    series: Option<IndicatorSeries>,
    builds: u64,
}

impl IndicatorSlot {
    fn rebuild(&mut self, bars: &[Bar]) {
        match build_series(&self.config, bars) {
            Ok(series) => {
                self.series = Some(series);
                self.builds += 1;
            }
            Err(e) => {
                warn!(error = %e, "indicator rebuild failed");
                self.series = None;
            }
        }
    }
}

/// Synchronizes the primary series with its derived indicator lines.
#[derive(Debug, Default)]
pub struct ChartSyncCoordinator {
    primary: BarSeries,
    slots: BTreeMap<IndicatorId, IndicatorSlot>,
}

impl ChartSyncCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Primary series ──────────────────────────────────────────────────

    /// Replace the primary series and drop its paired volume.
    ///
    /// Returns the new generation, which later live ticks must carry.
    ///
    /// # Errors
    /// [`crate::ChartError::MalformedSeries`] when bars are not strictly ascending;
    /// the coordinator is left exactly as it was.
    pub fn set_primary(&mut self, bars: Vec<Bar>) -> ChartResult<u64> {
        self.replace_range(bars, Vec::new())
    }

    /// Replace the primary series together with its volume in one step.
    ///
    /// # Errors
    /// [`crate::ChartError::MalformedSeries`] for unordered bars or volume keyed off
    /// the bar domain; nothing is changed.
    pub fn replace_range(&mut self, bars: Vec<Bar>, volume: Vec<VolumeBar>) -> ChartResult<u64> {
        let generation = self.primary.replace(bars, volume).map_err(|e| {
            warn!(error = %e, "primary series rejected");
            e
        })?;

        let bars = self.primary.bars();
        let mut rebuilt = 0usize;
        for slot in self.slots.values_mut() {
            slot.series = None;
            if slot.active {
                slot.rebuild(bars);
                rebuilt += 1;
            }
        }

        info!(
            generation,
            bars = bars.len(),
            volume = self.primary.volume().len(),
            rebuilt,
            invalidated = self.slots.len() - rebuilt,
            "primary series replaced"
        );
        Ok(generation)
    }

    /// Attach volume to the current primary series.
    pub fn set_volume(&mut self, volume: Vec<VolumeBar>) -> ChartResult<()> {
        self.primary.set_volume(volume)
    }

    /// Append or replace the tail bar.
    ///
    /// # Errors
    /// [`crate::ChartError::StaleUpdate`] when the tick does not extend the current
    /// generation's tail. The tick is dropped and nothing changes.
    pub fn apply_live(&mut self, update: &LiveUpdate) -> ChartResult<LiveApplied> {
        let applied = match self.primary.apply_live(update) {
            Ok(applied) => applied,
            Err(e) => {
                warn!(error = %e, generation = update.generation, "live update dropped");
                return Err(e);
            }
        };

        let bars = self.primary.bars();
        for slot in self.slots.values_mut() {
            if !slot.active {
                slot.series = None;
                continue;
            }
            match slot.series.as_mut() {
                Some(series) => series.patch_tail(bars),
                None => slot.rebuild(bars),
            }
        }

        debug!(time = %update.bar.time, ?applied, "live update applied");
        Ok(applied)
    }

    // ── Indicator slots ─────────────────────────────────────────────────

    /// Show an indicator, computing it only when no current values exist.
    ///
    /// # Errors
    /// [`crate::ChartError::InvalidConfig`]; other indicators are unaffected.
    pub fn enable(&mut self, config: IndicatorConfig) -> ChartResult<EnableOutcome> {
        config.validate()?;
        let id = config.id();
        let bars = self.primary.bars();

        let slot = self.slots.entry(id.clone()).or_insert_with(|| IndicatorSlot {
            config,
            active: false,
            series: None,
            builds: 0,
        });

        let outcome = match (slot.active, slot.series.is_some()) {
            (true, true) => EnableOutcome::Unchanged,
            (false, true) => EnableOutcome::Restored,
            (_, false) => {
                slot.rebuild(bars);
                EnableOutcome::Built
            }
        };
        slot.active = true;

        debug!(indicator = %id, ?outcome, "indicator enabled");
        Ok(outcome)
    }

    /// Hide an indicator. Its values stay stored for a later `enable`.
    /// Returns `false` when it was not active.
    pub fn disable(&mut self, id: &IndicatorId) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) if slot.active => {
                slot.active = false;
                debug!(indicator = %id, "indicator disabled");
                true
            }
            _ => false,
        }
    }

    /// Drop an indicator and its stored values.
    pub fn remove(&mut self, id: &IndicatorId) -> bool {
        self.slots.remove(id).is_some()
    }

    /// Swap one indicator's configuration for another.
    ///
    /// The old slot is removed and the new one built; other slots are left
    /// alone. An invalid new config leaves the old slot in place.
    pub fn reconfigure(&mut self, id: &IndicatorId, config: IndicatorConfig) -> ChartResult<EnableOutcome> {
        config.validate()?;
        let new_id = config.id();
        if new_id != *id {
            self.remove(id);
        }
        let outcome = self.enable(config)?;
        info!(from = %id, to = %new_id, ?outcome, "indicator reconfigured");
        Ok(outcome)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Snapshot of every active line at `time`, or the empty sample when the
    /// pointer is off the surface.
    ///
    /// Lookups are exact: a key the primary series does not contain yields no
    /// candle, and a line without a value at that key yields `None`.
    pub fn resolve_crosshair(&self, time: Option<TimeKey>) -> CrosshairSample {
        let line_keys = self.active_series().flat_map(|s| s.line_keys());
        let Some(time) = time else {
            return CrosshairSample::empty(line_keys);
        };

        let series_values = self
            .active_series()
            .flat_map(|s| s.lines.iter())
            .map(|line| (line.key.clone(), line.value_at(time)))
            .collect();

        CrosshairSample {
            time: Some(time),
            candle: self.primary.bar_at(time).copied(),
            volume: self.primary.volume_at(time).copied(),
            series_values,
        }
    }

    /// Active indicators with current values, in key order.
    pub fn active_series(&self) -> impl Iterator<Item = &IndicatorSeries> {
        self.slots
            .values()
            .filter(|s| s.active)
            .filter_map(|s| s.series.as_ref())
    }

    pub fn active_ids(&self) -> Vec<IndicatorId> {
        self.slots
            .iter()
            .filter(|(_, s)| s.active)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn is_active(&self, id: &IndicatorId) -> bool {
        self.slots.get(id).is_some_and(|s| s.active)
    }

    /// Values of any known indicator, rebuilding a hidden one if its values
    /// were invalidated.
    pub fn series(&mut self, id: &IndicatorId) -> Option<&IndicatorSeries> {
        let bars = self.primary.bars();
        let slot = self.slots.get_mut(id)?;
        if slot.series.is_none() {
            slot.rebuild(bars);
        }
        slot.series.as_ref()
    }

    /// How many times an indicator has been computed from scratch.
    pub fn build_count(&self, id: &IndicatorId) -> Option<u64> {
        self.slots.get(id).map(|s| s.builds)
    }

    pub fn bars(&self) -> &[Bar] {
        self.primary.bars()
    }

    pub fn volume(&self) -> &[VolumeBar] {
        self.primary.volume()
    }

    pub fn generation(&self) -> u64 {
        self.primary.generation()
    }

    pub fn summary(&self, params: &SummaryParams) -> TechnicalSummary {
        summarize(self.primary.bars(), params)
    }
}
