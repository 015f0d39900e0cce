use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};
use crate::types::{Bar, TimeKey, VolumeBar};

// ---------------------------------------------------------------------------
// Live updates
// ---------------------------------------------------------------------------

/// A single-bar live tick: append when newer than the tail, replace the tail
/// when it carries the tail's key.
///
/// `generation` is the value returned by the full-range replace this tick
/// extends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub generation: u64,
    pub bar: Bar,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// How a live tick landed in the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveApplied {
    Appended,
    ReplacedLast,
}

// ---------------------------------------------------------------------------
// BarSeries -- the primary OHLC series plus its paired volume
// ---------------------------------------------------------------------------

/// Primary price series of one chart. Replaced wholesale on a range change,
/// patched at the tail by live ticks.
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
    volume: Vec<VolumeBar>,
    generation: u64,
}

impl BarSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole series. Returns the new generation.
    ///
    /// # Errors
    /// [`ChartError::MalformedSeries`] when bars are not strictly ascending or
    /// a volume point has no bar; the previous series is kept.
    pub fn replace(&mut self, bars: Vec<Bar>, volume: Vec<VolumeBar>) -> ChartResult<u64> {
        check_strictly_ascending(&bars)?;
        check_volume_domain(&bars, &volume)?;

        self.bars = bars;
        self.volume = volume;
        self.generation += 1;
        Ok(self.generation)
    }

    /// Replace only the paired volume of the current bars.
    pub fn set_volume(&mut self, volume: Vec<VolumeBar>) -> ChartResult<()> {
        check_volume_domain(&self.bars, &volume)?;
        self.volume = volume;
        Ok(())
    }

    /// Apply a live tick.
    ///
    /// # Errors
    /// [`ChartError::StaleUpdate`] when the tick belongs to another generation
    /// or lands before the tail. The series is left untouched.
    pub fn apply_live(&mut self, update: &LiveUpdate) -> ChartResult<LiveApplied> {
        let time = update.bar.time;
        if self.generation == 0 {
            return Err(ChartError::stale(time, "no full-range replace received yet"));
        }
        if update.generation != self.generation {
            return Err(ChartError::stale(
                time,
                format!(
                    "patch for generation {} but series is at generation {}",
                    update.generation, self.generation
                ),
            ));
        }

        let applied = match self.bars.last() {
            Some(tail) if time < tail.time => {
                return Err(ChartError::stale(
                    time,
                    format!("patch precedes series tail {}", tail.time),
                ));
            }
            Some(tail) if time == tail.time => LiveApplied::ReplacedLast,
            _ => LiveApplied::Appended,
        };

        match applied {
            LiveApplied::ReplacedLast => {
                if let Some(last) = self.bars.last_mut() {
                    *last = update.bar;
                }
            }
            LiveApplied::Appended => self.bars.push(update.bar),
        }

        // Volume follows the bar; an existing volume point at the tail keeps
        // its value but is recoloured from the patched bar.
        let tail_volume = match self.volume.last() {
            Some(v) if v.time == time => Some(update.volume.unwrap_or(v.value)),
            _ => update.volume,
        };
        if let Some(value) = tail_volume {
            let paired = VolumeBar::paired(&update.bar, value);
            match self.volume.last_mut() {
                Some(v) if v.time == time => *v = paired,
                _ => self.volume.push(paired),
            }
        }

        Ok(applied)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn volume(&self) -> &[VolumeBar] {
        &self.volume
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn tail_time(&self) -> Option<TimeKey> {
        self.bars.last().map(|b| b.time)
    }

    /// Exact-key position of `time` in the series.
    pub fn index_of(&self, time: TimeKey) -> Option<usize> {
        self.bars.binary_search_by_key(&time, |b| b.time).ok()
    }

    pub fn bar_at(&self, time: TimeKey) -> Option<&Bar> {
        self.index_of(time).map(|i| &self.bars[i])
    }

    pub fn volume_at(&self, time: TimeKey) -> Option<&VolumeBar> {
        self.volume
            .binary_search_by_key(&time, |v| v.time)
            .ok()
            .map(|i| &self.volume[i])
    }

    /// Close prices in series order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn times(&self) -> Vec<TimeKey> {
        self.bars.iter().map(|b| b.time).collect()
    }
}

fn check_strictly_ascending(bars: &[Bar]) -> ChartResult<()> {
    for (i, w) in bars.windows(2).enumerate() {
        if w[1].time <= w[0].time {
            return Err(ChartError::malformed(format!(
                "bar {} at {} does not follow bar {} at {}",
                i + 1,
                w[1].time,
                i,
                w[0].time
            )));
        }
    }
    Ok(())
}

fn check_volume_domain(bars: &[Bar], volume: &[VolumeBar]) -> ChartResult<()> {
    for (i, w) in volume.windows(2).enumerate() {
        if w[1].time <= w[0].time {
            return Err(ChartError::malformed(format!(
                "volume point {} at {} does not follow {}",
                i + 1,
                w[1].time,
                w[0].time
            )));
        }
    }
    if let Some(orphan) = volume
        .iter()
        .find(|v| bars.binary_search_by_key(&v.time, |b| b.time).is_err())
    {
        return Err(ChartError::malformed(format!(
            "volume point at {} has no bar",
            orphan.time
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
