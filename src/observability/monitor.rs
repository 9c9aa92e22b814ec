use crate::aggregator::InventorySnapshot;

use super::IngestMetrics;

/// Status-bar text for an inventory snapshot, e.g.
/// `12 tags/second - 340 tags seen (3 uniques)`.
pub fn status_line(snapshot: &InventorySnapshot, tags_per_second: f64) -> String {
    format!(
        "{:.0} tags/second - {} tags seen ({} uniques)",
        tags_per_second,
        snapshot.total_tags_seen,
        snapshot.unique_epcs()
    )
}

/// Plain-text ingest report for logs and diagnostics.
pub fn ingest_report(metrics: &IngestMetrics) -> String {
    let dropped = metrics.samples_dropped();
    format!(
        "=== Ingest Metrics ===\n  Reports: {}\n  Samples: {}\n  Dropped: {}\n",
        metrics.reports_received(),
        metrics.samples_ingested(),
        if dropped > 0 {
            format!("{} sample{}", dropped, if dropped == 1 { "" } else { "s" })
        } else {
            "0 samples".to_string()
        }
    )
}
