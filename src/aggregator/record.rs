use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{TagSample, RSSI_FLOOR};
use crate::phase::TagHistory;

/// Composite identity for one physical tag-antenna pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagKey {
    pub epc: String,
    pub antenna_id: u16,
}

impl TagKey {
    pub fn new(epc: impl Into<String>, antenna_id: u16) -> Self {
        Self {
            epc: epc.into(),
            antenna_id,
        }
    }
}

/// One inventory entry, mutated in place on every matching report.
///
/// Invariants: `seen_count` and `best_rssi` never decrease, and
/// `first_seen_ms` is set once at first contact.
#[derive(Debug, Clone, Serialize)]
pub struct TagRecord {
    pub epc: String,
    pub antenna_id: u16,
    /// Running maximum of observed peak RSSI (dBm).
    pub best_rssi: i16,
    pub last_rssi: i16,
    /// Channel at first contact; 0 is the unset sentinel.
    pub first_channel: u16,
    pub last_channel: u16,
    /// Cumulative sum of per-report seen-count deltas.
    pub seen_count: u64,
    /// Elapsed milliseconds since the session anchor.
    pub first_seen_ms: u64,
    pub last_seen_ms: u64,
    /// Latest vendor phase angle, when the reader reports one.
    pub phase_angle: Option<u16>,
    pub doppler_hz: Option<i16>,
    /// Shared time-series handle, created lazily when history recording
    /// is enabled. Cleared only with the enclosing session.
    #[serde(skip)]
    pub history: Option<Arc<TagHistory>>,
}

impl TagRecord {
    pub(crate) fn new(key: &TagKey, first_seen_ms: u64) -> Self {
        Self {
            epc: key.epc.clone(),
            antenna_id: key.antenna_id,
            best_rssi: RSSI_FLOOR,
            last_rssi: RSSI_FLOOR,
            first_channel: 0,
            last_channel: 0,
            seen_count: 0,
            first_seen_ms,
            last_seen_ms: first_seen_ms,
            phase_angle: None,
            doppler_hz: None,
            history: None,
        }
    }

    /// Merge one raw sample into the record.
    pub(crate) fn merge(&mut self, sample: &TagSample, last_seen_ms: u64) {
        let rssi = sample.rssi_or_floor();
        let channel = sample.channel_or_default();

        self.seen_count += sample.seen_delta();
        self.best_rssi = self.best_rssi.max(rssi);
        self.last_rssi = rssi;
        self.last_channel = channel;
        if self.first_channel == 0 {
            self.first_channel = channel;
        }
        self.last_seen_ms = last_seen_ms;

        if let Some(phase) = sample.vendor.phase_angle() {
            self.phase_angle = Some(phase);
        }
        if let Some(doppler) = sample.vendor.doppler_hz() {
            self.doppler_hz = Some(doppler);
        }
    }
}
