use std::sync::Arc;
use std::thread;

use tagstream::aggregator::{TagAggregator, TagKey};
use tagstream::core::TagSample;

#[test]
fn test_two_batches_merge_into_one_record() {
    let aggregator = TagAggregator::new();
    aggregator.ingest(&[TagSample::new("E1", 1).with_rssi(-50).with_seen_count(3)]);
    aggregator.ingest(&[TagSample::new("E1", 1).with_rssi(-40).with_seen_count(2)]);

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.total_tags_seen, 5);

    let record = &snapshot.tags[&TagKey::new("E1", 1)];
    assert_eq!(record.seen_count, 5);
    assert_eq!(record.best_rssi, -40);
    assert_eq!(record.last_rssi, -40);
}

#[test]
fn test_same_epc_different_antennas_are_distinct() {
    let aggregator = TagAggregator::new();
    aggregator.ingest(&[TagSample::new("E1", 1), TagSample::new("E1", 2)]);

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.unique_epcs(), 1);
}

#[test]
fn test_snapshot_is_idempotent() {
    let aggregator = TagAggregator::new();
    aggregator.ingest(&[
        TagSample::new("E1", 1).with_rssi(-55).with_seen_count(2),
        TagSample::new("E2", 1).with_rssi(-60),
    ]);

    let first = aggregator.snapshot();
    let second = aggregator.snapshot();

    assert_eq!(first.total_tags_seen, second.total_tags_seen);
    assert_eq!(first.len(), second.len());
    for (key, record) in &first.tags {
        let other = &second.tags[key];
        assert_eq!(record.seen_count, other.seen_count);
        assert_eq!(record.best_rssi, other.best_rssi);
        assert_eq!(record.last_rssi, other.last_rssi);
        assert_eq!(record.first_seen_ms, other.first_seen_ms);
    }
}

#[test]
fn test_session_anchor_from_first_sample() {
    let aggregator = TagAggregator::new();
    // No explicit session start event: the first sample anchors the clock
    aggregator.ingest(&[
        TagSample::new("E1", 1).with_timestamps(5_000_000, 5_050_000)
    ]);
    aggregator.ingest(&[
        TagSample::new("E2", 1).with_timestamps(5_600_000, 5_650_000)
    ]);

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.tags[&TagKey::new("E1", 1)].first_seen_ms, 0);
    assert_eq!(snapshot.tags[&TagKey::new("E2", 1)].first_seen_ms, 600);
    assert_eq!(snapshot.tags[&TagKey::new("E2", 1)].last_seen_ms, 650);
}

#[test]
fn test_drain_updated_clears_atomically() {
    let aggregator = TagAggregator::new();
    aggregator.ingest(&[TagSample::new("E1", 1), TagSample::new("E2", 1)]);

    let drained = aggregator.drain_updated();
    assert_eq!(drained.len(), 2);
    assert!(drained.contains(&TagKey::new("E1", 1)));

    assert!(aggregator.drain_updated().is_empty());

    aggregator.ingest(&[TagSample::new("E1", 1)]);
    assert_eq!(aggregator.drain_updated().len(), 1);
}

#[test]
fn test_malformed_samples_skipped_without_failing_batch() {
    let aggregator = TagAggregator::new();
    aggregator.ingest(&[
        TagSample::new("", 1),
        TagSample::new("E1", 0),
        TagSample::new("E1", 1).with_seen_count(2),
    ]);

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.total_tags_seen, 2);

    let metrics = aggregator.metrics();
    assert_eq!(metrics.samples_dropped(), 2);
    assert_eq!(metrics.samples_ingested(), 1);
    assert_eq!(metrics.reports_received(), 1);
}

#[test]
fn test_clear_resets_everything() {
    let aggregator = TagAggregator::new();
    aggregator.ingest(&[
        TagSample::new("E1", 1).with_timestamps(1_000_000, 1_000_000)
    ]);
    aggregator.clear();

    assert!(aggregator.snapshot().is_empty());
    assert_eq!(aggregator.total_tags_seen(), 0);
    assert!(aggregator.drain_updated().is_empty());

    // A fresh anchor is established after the clear
    aggregator.ingest(&[
        TagSample::new("E2", 1).with_timestamps(9_000_000, 9_000_000)
    ]);
    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.tags[&TagKey::new("E2", 1)].first_seen_ms, 0);
}

#[test]
fn test_history_recording_toggle() {
    let aggregator = TagAggregator::new();
    aggregator.ingest(&[TagSample::new("E1", 1)]);
    assert!(aggregator.snapshot().tags[&TagKey::new("E1", 1)]
        .history
        .is_none());

    aggregator.set_history_enabled(true);
    aggregator.ingest(&[TagSample::new("E1", 1), TagSample::new("E1", 1)]);

    let snapshot = aggregator.snapshot();
    let history = snapshot.tags[&TagKey::new("E1", 1)]
        .history
        .as_ref()
        .expect("history created lazily on first enabled ingest");
    assert_eq!(history.len(), 2);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let aggregator = TagAggregator::new();
    aggregator.ingest(&[
        TagSample::new("E1", 1).with_rssi(-50).with_seen_count(2),
        TagSample::new("E2", 2),
    ]);

    // Composite keys rule out a JSON object; entries come out as a
    // sequence of (key, record) pairs.
    let value = serde_json::to_value(aggregator.snapshot()).unwrap();
    assert_eq!(value["total_tags_seen"], 2);

    let entries = value["tags"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let epcs: Vec<&str> = entries
        .iter()
        .map(|entry| entry[0]["epc"].as_str().unwrap())
        .collect();
    assert!(epcs.contains(&"E1"));
    assert!(epcs.contains(&"E2"));
}

#[test]
fn test_totals_consistent_under_concurrent_clear() {
    // Each batch is applied in one critical section, so the snapshot's
    // total always equals the sum of per-record counts no matter how
    // ingests interleave with clears.
    let aggregator = Arc::new(TagAggregator::new());

    let writer = {
        let aggregator = aggregator.clone();
        thread::spawn(move || {
            for i in 0..500u32 {
                let epc = format!("E{}", i % 7);
                aggregator.ingest(&[
                    TagSample::new(epc.clone(), 1).with_seen_count(2),
                    TagSample::new(epc, 2).with_seen_count(3),
                ]);
                if i % 97 == 0 {
                    aggregator.clear();
                }
            }
        })
    };

    let checker = {
        let aggregator = aggregator.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                let snapshot = aggregator.snapshot();
                let per_record: u64 =
                    snapshot.tags.values().map(|record| record.seen_count).sum();
                assert_eq!(snapshot.total_tags_seen, per_record);
            }
        })
    };

    writer.join().unwrap();
    checker.join().unwrap();

    let snapshot = aggregator.snapshot();
    let per_record: u64 = snapshot.tags.values().map(|record| record.seen_count).sum();
    assert_eq!(snapshot.total_tags_seen, per_record);
}
