use serde::{Deserialize, Serialize};

/// RSSI substituted when a reader omits PeakRSSI from a report.
pub const RSSI_FLOOR: i16 = -120;

/// Vendor-extension capability of the reporting reader.
///
/// Correction-strategy selection depends entirely on which variant is
/// active, so the phase/Doppler fields travel together rather than as
/// loose optionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorData {
    /// Reader without low-level extensions; no phase or Doppler data.
    Legacy,
    /// Extended reader reporting RF phase angle and Doppler frequency.
    Extended {
        /// Fixed-point angle on a 0..4096 scale mapping to [0, 2pi).
        phase_angle: u16,
        /// Doppler frequency in Hz.
        doppler_hz: i16,
    },
}

impl Default for VendorData {
    fn default() -> Self {
        VendorData::Legacy
    }
}

impl VendorData {
    pub fn phase_angle(&self) -> Option<u16> {
        match self {
            VendorData::Legacy => None,
            VendorData::Extended { phase_angle, .. } => Some(*phase_angle),
        }
    }

    pub fn doppler_hz(&self) -> Option<i16> {
        match self {
            VendorData::Legacy => None,
            VendorData::Extended { doppler_hz, .. } => Some(*doppler_hz),
        }
    }
}

/// One raw tag observation as decoded from a reader report.
///
/// The EPC is expected to be decoded and upper-cased by the caller before
/// it reaches the core. Every other field is optional per reader
/// capability; absence means "not reported this cycle", never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSample {
    pub epc: String,
    pub antenna_id: u16,
    pub peak_rssi: Option<i16>,
    pub channel_index: Option<u16>,
    pub seen_count: Option<u32>,
    /// Absolute first-seen timestamp in microseconds.
    pub first_seen_us: Option<u64>,
    /// Absolute last-seen timestamp in microseconds.
    pub last_seen_us: Option<u64>,
    #[serde(default)]
    pub vendor: VendorData,
}

impl TagSample {
    pub fn new(epc: impl Into<String>, antenna_id: u16) -> Self {
        Self {
            epc: epc.into(),
            antenna_id,
            peak_rssi: None,
            channel_index: None,
            seen_count: None,
            first_seen_us: None,
            last_seen_us: None,
            vendor: VendorData::Legacy,
        }
    }

    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.peak_rssi = Some(rssi);
        self
    }

    pub fn with_channel(mut self, channel: u16) -> Self {
        self.channel_index = Some(channel);
        self
    }

    pub fn with_seen_count(mut self, count: u32) -> Self {
        self.seen_count = Some(count);
        self
    }

    pub fn with_timestamps(mut self, first_seen_us: u64, last_seen_us: u64) -> Self {
        self.first_seen_us = Some(first_seen_us);
        self.last_seen_us = Some(last_seen_us);
        self
    }

    pub fn with_vendor(mut self, phase_angle: u16, doppler_hz: i16) -> Self {
        self.vendor = VendorData::Extended {
            phase_angle,
            doppler_hz,
        };
        self
    }

    pub fn rssi_or_floor(&self) -> i16 {
        self.peak_rssi.unwrap_or(RSSI_FLOOR)
    }

    pub fn channel_or_default(&self) -> u16 {
        self.channel_index.unwrap_or(0)
    }

    pub fn seen_delta(&self) -> u64 {
        u64::from(self.seen_count.unwrap_or(1))
    }
}

/// Ordered batch of samples delivered in one reader report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagReport {
    /// Sequential report number for ordering.
    pub sequence_id: u64,
    pub samples: Vec<TagSample>,
}

impl TagReport {
    pub fn new(sequence_id: u64, samples: Vec<TagSample>) -> Self {
        Self {
            sequence_id,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_defaults() {
        let sample = TagSample::new("E200001122334455", 1);
        assert_eq!(sample.rssi_or_floor(), RSSI_FLOOR);
        assert_eq!(sample.channel_or_default(), 0);
        assert_eq!(sample.seen_delta(), 1);
        assert_eq!(sample.vendor, VendorData::Legacy);
    }

    #[test]
    fn test_vendor_fields() {
        let sample = TagSample::new("E2", 1).with_vendor(2048, -40);
        assert_eq!(sample.vendor.phase_angle(), Some(2048));
        assert_eq!(sample.vendor.doppler_hz(), Some(-40));
    }
}
