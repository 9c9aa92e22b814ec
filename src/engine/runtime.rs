use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use crossbeam_channel::Receiver;
use log::info;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::aggregator::{InventorySnapshot, TagAggregator, TagKey};
use crate::observability::IngestMetrics;
use crate::rate::RateEstimator;
use crate::reader::ReaderEvent;

/// Runtime status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeStatus {
    Stopped,
    Running,
}

/// Orchestrates the connection between a reader event feed and the
/// aggregation core.
///
/// A single tokio task drains `ReaderEvent`s from the crossbeam receiver
/// (the producer side lives on a caller-owned reader thread) and applies
/// report batches to the aggregator. Consumers pull snapshots and rate
/// estimates from their own scheduling context.
pub struct InventoryRuntime {
    aggregator: Arc<TagAggregator>,
    rate: Mutex<RateEstimator>,
    events_rx: Receiver<ReaderEvent>,
    status: RuntimeStatus,
    /// Shutdown signal broadcaster for the drain task.
    shutdown_tx: Option<broadcast::Sender<()>>,
    drain_handle: Option<JoinHandle<()>>,
}

impl InventoryRuntime {
    pub fn new(events_rx: Receiver<ReaderEvent>) -> Self {
        Self {
            aggregator: Arc::new(TagAggregator::new()),
            rate: Mutex::new(RateEstimator::default()),
            events_rx,
            status: RuntimeStatus::Stopped,
            shutdown_tx: None,
            drain_handle: None,
        }
    }

    pub fn status(&self) -> RuntimeStatus {
        self.status
    }

    pub fn aggregator(&self) -> Arc<TagAggregator> {
        self.aggregator.clone()
    }

    pub fn metrics(&self) -> Arc<IngestMetrics> {
        self.aggregator.metrics()
    }

    pub fn set_history_enabled(&self, enabled: bool) {
        self.aggregator.set_history_enabled(enabled);
    }

    fn lock_rate(&self) -> MutexGuard<'_, RateEstimator> {
        self.rate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start draining reader events.
    pub fn start(&mut self) -> Result<()> {
        if self.status == RuntimeStatus::Running {
            return Err(anyhow!("runtime is already running"));
        }

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(16);
        let events_rx = self.events_rx.clone();
        let aggregator = self.aggregator.clone();

        let handle = tokio::spawn(async move {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                match events_rx.try_recv() {
                    Ok(ReaderEvent::Report(report)) => {
                        aggregator.ingest(&report.samples);
                    }
                    Ok(ReaderEvent::Connection(true)) => {
                        info!("reader connected");
                    }
                    Ok(ReaderEvent::Connection(false)) => {
                        info!("reader disconnected, clearing session state");
                        aggregator.clear();
                    }
                    Err(crossbeam_channel::TryRecvError::Empty) => {
                        // No events pending, yield
                        tokio::task::yield_now().await;
                    }
                    Err(crossbeam_channel::TryRecvError::Disconnected) => {
                        info!("reader event channel closed");
                        break;
                    }
                }
            }
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.drain_handle = Some(handle);
        self.status = RuntimeStatus::Running;
        Ok(())
    }

    /// Stop the drain task and wait for it to finish. Aggregated state is
    /// kept; use `clear` for a full reset.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status == RuntimeStatus::Stopped {
            return Ok(());
        }

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.drain_handle.take() {
            let _ = handle.await;
        }
        self.status = RuntimeStatus::Stopped;
        Ok(())
    }

    /// Smoothed throughput over the recent sampling window.
    pub fn tags_per_second(&self) -> f64 {
        let total = self.aggregator.total_tags_seen();
        self.lock_rate().sample(total as f64)
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        self.aggregator.snapshot()
    }

    pub fn drain_updated(&self) -> HashSet<TagKey> {
        self.aggregator.drain_updated()
    }

    /// Full session reset: inventory, counters, anchor and rate window.
    pub fn clear(&self) {
        self.aggregator.clear();
        self.lock_rate().reset(0.0);
    }
}

/// Note: the drain task is detached on drop; `stop()` should be called
/// for a clean join. Drop only signals shutdown since it cannot await.
impl Drop for InventoryRuntime {
    fn drop(&mut self) {
        if let Some(tx) = &self.shutdown_tx {
            let _ = tx.send(());
        }
    }
}
