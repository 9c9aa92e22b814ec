use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::history::{HistoryData, TagHistory};

/// Per-channel calibration constants relating a reference channel's phase
/// to every other channel's, produced by an external calibration procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    /// Channel -> phase offset in radians.
    offsets: HashMap<u16, f64>,
    /// Channel -> carrier frequency in Hz.
    hoptable: HashMap<u16, f64>,
    /// Fixed reference channel, typically 1.
    reference: u16,
}

impl CalibrationTable {
    pub fn new(offsets: HashMap<u16, f64>, hoptable: HashMap<u16, f64>, reference: u16) -> Self {
        Self {
            offsets,
            hoptable,
            reference,
        }
    }

    /// Build a table from JSON config:
    /// `{"reference": 1, "offsets": {"1": 0.1}, "hoptable": {"1": 902.75e6}}`
    pub fn from_json(config: &Value) -> Result<Self> {
        let reference = config["reference"]
            .as_u64()
            .ok_or_else(|| anyhow!("calibration table missing reference channel"))? as u16;

        let parse_map = |key: &str| -> Result<HashMap<u16, f64>> {
            let object = config[key]
                .as_object()
                .ok_or_else(|| anyhow!("calibration table missing {key} map"))?;
            let mut map = HashMap::new();
            for (channel, value) in object {
                let channel: u16 = channel
                    .parse()
                    .map_err(|_| anyhow!("bad channel key in {key}: {channel}"))?;
                let value = value
                    .as_f64()
                    .ok_or_else(|| anyhow!("non-numeric value in {key} for channel {channel}"))?;
                map.insert(channel, value);
            }
            Ok(map)
        };

        Ok(Self {
            offsets: parse_map("offsets")?,
            hoptable: parse_map("hoptable")?,
            reference,
        })
    }

    /// Map a raw wrapped phase observed on `channel` into the reference
    /// channel's phase frame.
    fn correct(&self, raw_phase: f64, channel: u16) -> f64 {
        let offset = self.offsets.get(&channel).copied().unwrap_or(0.0);
        let offset_ref = self.offsets.get(&self.reference).copied().unwrap_or(0.0);
        let freq_ref = self.hoptable.get(&self.reference).copied().unwrap_or(1.0);
        let freq = self.hoptable.get(&channel).copied().unwrap_or(freq_ref);

        ((raw_phase - offset) * (freq_ref / freq) + offset_ref).rem_euclid(TAU)
    }
}

/// Correction strategy applied when advancing a tag's corrected series.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionMode {
    /// Force continuity at channel-hop boundaries by re-deriving a scalar
    /// shift; no calibration data required. `sine` maps each corrected
    /// value through sin(2x), an experimental visualization aid.
    ShiftRemoval { sine: bool },
    /// Calibrated multi-channel correction followed by unwrap.
    Calibrated(CalibrationTable),
    /// No vendor phase data at all: fill with a constant so series
    /// lengths stay aligned without implying a real correction.
    Dummy,
}

/// Resolve a cross-2pi discontinuity between consecutive corrected values.
///
/// Guarantees |result - p1| <= pi for inputs within one wrap of each other.
pub fn unwrap_step(p1: f64, p2: f64) -> f64 {
    let delta = p2 - p1;
    if delta >= PI {
        p2 - TAU
    } else if delta <= -PI {
        p2 + TAU
    } else {
        p2
    }
}

/// Replay samples appended since the last pass through the selected
/// strategy. Idempotent: repeated calls with no new data are no-ops, and
/// an empty history is a no-op rather than an error.
pub fn advance_correction(history: &TagHistory, mode: &CorrectionMode) {
    let mut data = history.lock();
    if data.is_empty() || data.last_size == data.len() {
        return;
    }
    match mode {
        CorrectionMode::ShiftRemoval { sine } => remove_shift(&mut data, *sine),
        CorrectionMode::Calibrated(table) => remove_shift_calibrated(&mut data, table),
        CorrectionMode::Dummy => fill_dummy(&mut data),
    }
}

fn remove_shift(data: &mut HistoryData, sine: bool) {
    if data.last_channel.is_none() {
        data.last_channel = Some(data.channels[0]);
    }
    let len = data.len();
    for i in data.last_size..len {
        if Some(data.channels[i]) != data.last_channel {
            let last_corrected = data.corrects.last().copied().unwrap_or(0.0);
            data.shift = data.phases[i] - last_corrected;
            data.last_channel = Some(data.channels[i]);
        }
        let mut value = (data.phases[i] - data.shift).rem_euclid(TAU);
        if sine {
            value = (2.0 * value).sin();
        }
        data.corrects.push(value);
    }
    data.last_size = len;
}

fn remove_shift_calibrated(data: &mut HistoryData, table: &CalibrationTable) {
    let len = data.len();
    for i in data.last_size..len {
        let corrected = table.correct(data.phases[i], data.channels[i]);
        let value = match data.corrects.last().copied() {
            Some(prev) if data.corrects.len() > 1 => unwrap_step(prev, corrected),
            _ => corrected,
        };
        data.corrects.push(value);
    }
    data.last_size = len;
}

fn fill_dummy(data: &mut HistoryData) {
    let len = data.len();
    data.corrects.resize(len, 0.0);
    data.last_size = len;
}
