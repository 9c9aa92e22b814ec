use anyhow::{bail, Result};
use async_trait::async_trait;
use crossbeam_channel::Sender;
use log::info;

use crate::core::{TagReport, TagSample};

use super::traits::ReaderClient;
use super::types::{ReaderCapabilities, ReaderEvent};

/// Deterministic reader for development and CI.
///
/// Generates plausible report batches without any wire protocol: RSSI and
/// channel walk fixed cycles, and the vendor phase angle advances by a
/// constant step per report so correction code sees realistic rotation.
pub struct SimulatedReader {
    events: Sender<ReaderEvent>,
    capabilities: ReaderCapabilities,
    connected: bool,
    inventorying: bool,
    sequence: u64,
    channel_plan: Vec<u16>,
}

impl SimulatedReader {
    pub fn new(events: Sender<ReaderEvent>) -> Self {
        Self {
            events,
            capabilities: ReaderCapabilities {
                max_antennas: 2,
                vendor_extensions: false,
                tx_power_table: (15..25).collect(),
            },
            connected: false,
            inventorying: false,
            sequence: 0,
            channel_plan: vec![1, 2, 3],
        }
    }

    pub fn with_vendor_extensions(mut self) -> Self {
        self.capabilities.vendor_extensions = true;
        self
    }

    /// Signal a connection state change, as a real client would on
    /// connect/disconnect.
    pub fn set_connected(&mut self, connected: bool) -> Result<()> {
        self.connected = connected;
        if !connected {
            self.inventorying = false;
        }
        self.events.send(ReaderEvent::Connection(connected))?;
        Ok(())
    }

    /// Emit one report carrying a sample per EPC.
    pub fn emit_report(&mut self, epcs: &[&str]) -> Result<()> {
        if !self.inventorying {
            bail!("reader is not inventorying");
        }
        let sequence = self.sequence;
        let samples = epcs
            .iter()
            .enumerate()
            .map(|(i, epc)| {
                let n = sequence + i as u64;
                let channel = self.channel_plan[(n % self.channel_plan.len() as u64) as usize];
                let timestamp_us = 1_000_000 + n * 100_000;
                let mut sample = TagSample::new(*epc, 1)
                    .with_rssi(-60 + (n % 15) as i16)
                    .with_channel(channel)
                    .with_seen_count(1)
                    .with_timestamps(timestamp_us, timestamp_us + 50_000);
                if self.capabilities.vendor_extensions {
                    sample = sample.with_vendor(((n * 257) % 4096) as u16, (n % 100) as i16 - 50);
                }
                sample
            })
            .collect();

        self.events
            .send(ReaderEvent::Report(TagReport::new(sequence, samples)))?;
        self.sequence += epcs.len() as u64;
        Ok(())
    }
}

#[async_trait]
impl ReaderClient for SimulatedReader {
    async fn start_inventory(&mut self) -> Result<()> {
        if !self.connected {
            self.set_connected(true)?;
        }
        self.inventorying = true;
        info!("simulated reader: inventory started");
        Ok(())
    }

    async fn stop_inventory(&mut self) -> Result<()> {
        self.inventorying = false;
        info!("simulated reader: inventory stopped");
        Ok(())
    }

    fn capabilities(&self) -> ReaderCapabilities {
        self.capabilities.clone()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
