use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::warn;
use serde::{Serialize, Serializer};

use crate::core::TagSample;
use crate::observability::IngestMetrics;
use crate::phase::TagHistory;

use super::record::{TagKey, TagRecord};

#[derive(Default)]
struct InventoryState {
    tags: HashMap<TagKey, TagRecord>,
    /// Cumulative sum of seen-count deltas across all tags.
    total_tags_seen: u64,
    /// First reported timestamp (microseconds), set once per session.
    session_anchor_us: Option<u64>,
    /// Keys touched since the last drain.
    updated_keys: HashSet<TagKey>,
}

impl InventoryState {
    fn apply(&mut self, sample: &TagSample, history_enabled: bool) {
        let anchor = match self.session_anchor_us {
            Some(anchor) => anchor,
            None => {
                // Session start was missed, or data was cleared
                // mid-inventory: anchor on this sample and treat its own
                // offset as zero.
                let anchor = sample.first_seen_us.unwrap_or(0);
                self.session_anchor_us = Some(anchor);
                anchor
            }
        };
        let first_seen_ms = sample.first_seen_us.unwrap_or(anchor).saturating_sub(anchor) / 1000;
        let last_seen_ms = sample.last_seen_us.unwrap_or(anchor).saturating_sub(anchor) / 1000;

        let key = TagKey::new(sample.epc.clone(), sample.antenna_id);
        let record = self
            .tags
            .entry(key.clone())
            .or_insert_with(|| TagRecord::new(&key, first_seen_ms));
        record.merge(sample, last_seen_ms);

        if history_enabled {
            let history = record
                .history
                .get_or_insert_with(|| Arc::new(TagHistory::new()));
            history.append(
                first_seen_ms,
                sample.rssi_or_floor(),
                sample.channel_or_default(),
                sample.vendor.phase_angle(),
                sample.vendor.doppler_hz(),
            );
        }

        self.total_tags_seen += sample.seen_delta();
        self.updated_keys.insert(key);
    }
}

/// Point-in-time copy of the inventory for rendering.
///
/// This is a shallow copy: the key set and field values are mutually
/// consistent as of the copy instant, while history handles remain shared
/// with the live records. Each history carries its own lock, so reads
/// through it stay internally consistent.
#[derive(Debug, Clone, Serialize)]
pub struct InventorySnapshot {
    /// Serialized as a sequence of (key, record) pairs; composite keys
    /// are not representable as JSON map keys.
    #[serde(serialize_with = "serialize_tag_entries")]
    pub tags: HashMap<TagKey, TagRecord>,
    pub total_tags_seen: u64,
}

fn serialize_tag_entries<S>(
    tags: &HashMap<TagKey, TagRecord>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(tags.iter())
}

impl InventorySnapshot {
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of distinct EPCs, ignoring the antenna ordinal.
    pub fn unique_epcs(&self) -> usize {
        self.tags
            .keys()
            .map(|key| key.epc.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Canonical per-tag inventory.
///
/// One mutex guards the map and session counters; a whole ingest batch is
/// applied inside a single critical section so snapshots never observe a
/// partially-applied batch.
pub struct TagAggregator {
    inner: Mutex<InventoryState>,
    history_enabled: AtomicBool,
    metrics: Arc<IngestMetrics>,
}

impl TagAggregator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(InventoryState::default()),
            history_enabled: AtomicBool::new(false),
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, InventoryState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enable or disable per-tag history recording. Records created while
    /// disabled get their history lazily on the first enabled ingest.
    pub fn set_history_enabled(&self, enabled: bool) {
        self.history_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn history_enabled(&self) -> bool {
        self.history_enabled.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> Arc<IngestMetrics> {
        self.metrics.clone()
    }

    /// Merge a batch of raw samples into the inventory, atomically with
    /// respect to concurrent snapshots and clears.
    ///
    /// Malformed samples (empty EPC or zero antenna ordinal) are skipped
    /// and counted; the rest of the batch proceeds.
    pub fn ingest(&self, samples: &[TagSample]) {
        if samples.is_empty() {
            return;
        }
        let history_enabled = self.history_enabled();
        let mut state = self.lock_inner();
        for sample in samples {
            if sample.epc.is_empty() || sample.antenna_id == 0 {
                warn!(
                    "skipping malformed sample: epc={:?} antenna={}",
                    sample.epc, sample.antenna_id
                );
                self.metrics.record_sample_dropped();
                continue;
            }
            state.apply(sample, history_enabled);
            self.metrics.record_sample();
        }
        drop(state);
        self.metrics.record_report();
    }

    /// Shallow point-in-time copy of the inventory map.
    pub fn snapshot(&self) -> InventorySnapshot {
        let state = self.lock_inner();
        InventorySnapshot {
            tags: state.tags.clone(),
            total_tags_seen: state.total_tags_seen,
        }
    }

    /// Take the set of keys touched since the last drain, clearing it
    /// atomically.
    pub fn drain_updated(&self) -> HashSet<TagKey> {
        std::mem::take(&mut self.lock_inner().updated_keys)
    }

    pub fn total_tags_seen(&self) -> u64 {
        self.lock_inner().total_tags_seen
    }

    pub fn len(&self) -> usize {
        self.lock_inner().tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_inner().tags.is_empty()
    }

    /// Atomically empty the inventory and reset session state. Ingest
    /// calls racing a clear land entirely before or entirely after it.
    pub fn clear(&self) {
        let mut state = self.lock_inner();
        state.tags.clear();
        state.total_tags_seen = 0;
        state.session_anchor_us = None;
        state.updated_keys.clear();
    }
}

impl Default for TagAggregator {
    fn default() -> Self {
        Self::new()
    }
}
