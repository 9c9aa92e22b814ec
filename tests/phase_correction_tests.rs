use std::f64::consts::PI;

use tagstream::aggregator::{TagAggregator, TagKey};
use tagstream::core::TagSample;
use tagstream::phase::{advance_correction, CorrectionMode, DataSeries, PHASE_SCALE};

fn to_angle(radians: f64) -> u16 {
    (radians / PHASE_SCALE).round() as u16
}

fn vendor_sample(epc: &str, channel: u16, radians: f64, timestamp_us: u64) -> TagSample {
    TagSample::new(epc, 1)
        .with_channel(channel)
        .with_timestamps(timestamp_us, timestamp_us)
        .with_vendor(to_angle(radians), 0)
}

#[test]
fn test_corrected_series_catches_up_across_ingests() {
    let aggregator = TagAggregator::new();
    aggregator.set_history_enabled(true);
    let mode = CorrectionMode::ShiftRemoval { sine: false };
    let key = TagKey::new("E1", 1);

    aggregator.ingest(&[
        vendor_sample("E1", 1, 1.0, 1_000_000),
        vendor_sample("E1", 1, 1.1, 1_100_000),
    ]);
    {
        let snapshot = aggregator.snapshot();
        let history = snapshot.tags[&key].history.as_ref().unwrap().clone();
        advance_correction(&history, &mode);
        let (times, corrects) = history.series(DataSeries::CorrectedPhase);
        assert_eq!(times.len(), 2);
        assert_eq!(corrects.len(), 2);
    }

    aggregator.ingest(&[vendor_sample("E1", 1, 1.2, 1_200_000)]);
    let snapshot = aggregator.snapshot();
    let history = snapshot.tags[&key].history.as_ref().unwrap().clone();
    advance_correction(&history, &mode);

    let (times, corrects) = history.series(DataSeries::CorrectedPhase);
    assert_eq!(times.len(), 3);
    assert_eq!(corrects.len(), 3);
    assert_eq!(times, vec![0, 100, 200]);
}

#[test]
fn test_channel_hop_keeps_plot_continuous() {
    let aggregator = TagAggregator::new();
    aggregator.set_history_enabled(true);

    // Steady rotation interrupted by a channel hop with a phase jump
    aggregator.ingest(&[
        vendor_sample("E1", 1, 2.0, 1_000_000),
        vendor_sample("E1", 1, 2.2, 1_100_000),
        vendor_sample("E1", 2, 5.5, 1_200_000),
        vendor_sample("E1", 2, 5.7, 1_300_000),
    ]);

    let snapshot = aggregator.snapshot();
    let history = snapshot.tags[&TagKey::new("E1", 1)]
        .history
        .as_ref()
        .unwrap()
        .clone();
    advance_correction(&history, &CorrectionMode::ShiftRemoval { sine: false });

    let (_, corrects) = history.series(DataSeries::CorrectedPhase);
    for pair in corrects.windows(2) {
        assert!(
            (pair[1] - pair[0]).abs() <= PI,
            "discontinuity survived correction: {} -> {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_legacy_reader_uses_dummy_fill() {
    let aggregator = TagAggregator::new();
    aggregator.set_history_enabled(true);

    // No vendor extension data at all
    aggregator.ingest(&[
        TagSample::new("E1", 1).with_channel(1),
        TagSample::new("E1", 1).with_channel(2),
        TagSample::new("E1", 1).with_channel(1),
    ]);

    let snapshot = aggregator.snapshot();
    let history = snapshot.tags[&TagKey::new("E1", 1)]
        .history
        .as_ref()
        .unwrap()
        .clone();
    advance_correction(&history, &CorrectionMode::Dummy);

    let (times, corrects) = history.series(DataSeries::CorrectedPhase);
    assert_eq!(corrects.len(), times.len());
    assert!(corrects.iter().all(|&v| v == 0.0));
}

#[test]
fn test_phase_diff_through_full_ingest_path() {
    let aggregator = TagAggregator::new();
    aggregator.set_history_enabled(true);

    aggregator.ingest(&[
        vendor_sample("E1", 1, 0.1, 1_000_000),
        vendor_sample("E1", 2, 0.2, 1_100_000),
        vendor_sample("E1", 1, 0.3, 1_200_000),
    ]);

    let snapshot = aggregator.snapshot();
    let history = snapshot.tags[&TagKey::new("E1", 1)]
        .history
        .as_ref()
        .unwrap()
        .clone();
    let (_, diffs) = history.series(DataSeries::PhaseDiff);

    assert_eq!(diffs.len(), 3);
    for diff in diffs {
        assert!(diff.abs() < 1e-9, "channel hops must not spike diffs: {diff}");
    }
}

#[test]
fn test_rssi_series_for_plotting() {
    let aggregator = TagAggregator::new();
    aggregator.set_history_enabled(true);

    aggregator.ingest(&[
        TagSample::new("E1", 1).with_rssi(-52).with_timestamps(1_000_000, 1_000_000),
        TagSample::new("E1", 1).with_rssi(-47).with_timestamps(1_200_000, 1_200_000),
    ]);

    let snapshot = aggregator.snapshot();
    let history = snapshot.tags[&TagKey::new("E1", 1)]
        .history
        .as_ref()
        .unwrap()
        .clone();
    let (times, rssis) = history.series(DataSeries::Rssi);
    assert_eq!(times, vec![0, 200]);
    assert_eq!(rssis, vec![-52.0, -47.0]);
}
