use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the ingest path. Shared between the producer task and
/// periodic consumers, so everything is atomic.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    reports_received: AtomicU64,
    samples_ingested: AtomicU64,
    samples_dropped: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports_received(&self) -> u64 {
        self.reports_received.load(Ordering::Relaxed)
    }

    pub fn samples_ingested(&self) -> u64 {
        self.samples_ingested.load(Ordering::Relaxed)
    }

    pub fn samples_dropped(&self) -> u64 {
        self.samples_dropped.load(Ordering::Relaxed)
    }

    pub fn record_report(&self) {
        self.reports_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sample(&self) {
        self.samples_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sample_dropped(&self) {
        self.samples_dropped.fetch_add(1, Ordering::Relaxed);
    }
}
