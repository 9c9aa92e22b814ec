use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::core::TagReport;

/// Asynchronous notification from a reader client.
#[derive(Debug, Clone)]
pub enum ReaderEvent {
    /// Ordered batch of tag samples from one report.
    Report(TagReport),
    /// Connection state change; `false` triggers session teardown.
    Connection(bool),
}

/// Capabilities advertised by a reader after connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderCapabilities {
    pub max_antennas: u16,
    /// Whether the reader exposes vendor phase/Doppler extensions.
    pub vendor_extensions: bool,
    /// Transmit power table in dB, index-addressed.
    pub tx_power_table: Vec<i16>,
}

impl Default for ReaderCapabilities {
    fn default() -> Self {
        Self {
            max_antennas: 1,
            vendor_extensions: false,
            tx_power_table: Vec::new(),
        }
    }
}

/// Bounded channel pair bridging a caller-owned reader callback thread
/// into the inventory runtime.
pub fn event_channel(capacity: usize) -> (Sender<ReaderEvent>, Receiver<ReaderEvent>) {
    bounded(capacity)
}
