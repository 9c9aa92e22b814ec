use std::f64::consts::TAU;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// Scale factor mapping the fixed-point 0..4096 phase angle to radians.
pub const PHASE_SCALE: f64 = TAU / 4096.0;

/// Raw phase deltas beyond this are treated as wrap artifacts. The value
/// is already scaled to radians, so a genuine step never exceeds 2pi.
const DIFF_WRAP_GUARD: f64 = 6.0;

/// Selector for the per-tag plot series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSeries {
    RawPhase,
    CorrectedPhase,
    Doppler,
    Rssi,
    PhaseDiff,
}

/// Parallel append-only sequences for one tag, plus the derived
/// corrected-phase and cumulative-diff series.
///
/// Invariant: `times_ms`, `rssis`, `channels`, `phases` and `dopplers`
/// always have equal length; `corrects` is <= that length and catches up
/// lazily on each correction pass.
#[derive(Debug)]
pub struct HistoryData {
    pub times_ms: Vec<u64>,
    pub rssis: Vec<i16>,
    pub channels: Vec<u16>,
    /// Raw wrapped phase in radians, [0, 2pi).
    pub phases: Vec<f64>,
    pub dopplers: Vec<f64>,
    /// Corrected phase, grown by `advance_correction`.
    pub corrects: Vec<f64>,
    /// Cumulative unwrapped phase delta.
    pub diffs: Vec<f64>,

    pub(crate) shift: f64,
    pub(crate) last_size: usize,
    pub(crate) last_channel: Option<u16>,
}

impl HistoryData {
    fn new() -> Self {
        Self {
            times_ms: Vec::new(),
            rssis: Vec::new(),
            channels: Vec::new(),
            phases: Vec::new(),
            dopplers: Vec::new(),
            corrects: Vec::new(),
            // Seeded so the diff series aligns once two samples exist.
            diffs: vec![0.0, 0.0],
            shift: 0.0,
            last_size: 0,
            last_channel: None,
        }
    }

    pub fn len(&self) -> usize {
        self.times_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times_ms.is_empty()
    }

    fn push(&mut self, time_ms: u64, rssi: i16, channel: u16, phase: Option<u16>, doppler: Option<i16>) {
        self.times_ms.push(time_ms);
        self.rssis.push(rssi);
        self.channels.push(channel);
        self.phases.push(f64::from(phase.unwrap_or(0)) * PHASE_SCALE);
        self.dopplers.push(f64::from(doppler.unwrap_or(0)));
        self.update_diff();
    }

    /// Cumulative unwrapped delta, updated once per appended sample.
    ///
    /// A channel hop shifts phase without genuine tag rotation, so the
    /// previous diff value is repeated instead of spiking the sum.
    fn update_diff(&mut self) {
        let n = self.times_ms.len();
        if n <= 2 {
            return;
        }
        let last = self.diffs.last().copied().unwrap_or(0.0);
        if self.channels[n - 1] != self.channels[n - 2] {
            self.diffs.push(last);
        } else {
            let mut diff = self.phases[n - 1] - self.phases[n - 2];
            if diff > DIFF_WRAP_GUARD {
                diff -= TAU;
            } else if diff < -DIFF_WRAP_GUARD {
                diff += TAU;
            }
            self.diffs.push(last + diff);
        }
    }

    pub(crate) fn series_values(&self, series: DataSeries) -> Vec<f64> {
        match series {
            DataSeries::RawPhase => self.phases.clone(),
            DataSeries::CorrectedPhase => self.corrects.clone(),
            DataSeries::Doppler => self.dopplers.clone(),
            DataSeries::Rssi => self.rssis.iter().map(|&r| f64::from(r)).collect(),
            DataSeries::PhaseDiff => self.diffs.clone(),
        }
    }
}

/// Per-tag time series container.
///
/// Each history carries its own lock so correction advancement for one
/// tag never blocks ingestion for another.
#[derive(Debug)]
pub struct TagHistory {
    data: Mutex<HistoryData>,
}

impl TagHistory {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HistoryData::new()),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HistoryData> {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append one raw sample with an elapsed time relative to the
    /// session anchor.
    pub fn append(
        &self,
        time_ms: u64,
        rssi: i16,
        channel: u16,
        phase: Option<u16>,
        doppler: Option<i16>,
    ) {
        self.lock().push(time_ms, rssi, channel, phase, doppler);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Point-in-time copy of (times, values) for one plot series.
    pub fn series(&self, series: DataSeries) -> (Vec<u64>, Vec<f64>) {
        let data = self.lock();
        (data.times_ms.clone(), data.series_values(series))
    }

    /// Tail of a series for rolling plot viewports.
    pub fn series_tail(&self, series: DataSeries, window: usize) -> (Vec<u64>, Vec<f64>) {
        let data = self.lock();
        let values = data.series_values(series);
        let times_start = data.times_ms.len().saturating_sub(window);
        let values_start = values.len().saturating_sub(window);
        (
            data.times_ms[times_start..].to_vec(),
            values[values_start..].to_vec(),
        )
    }
}

impl Default for TagHistory {
    fn default() -> Self {
        Self::new()
    }
}
