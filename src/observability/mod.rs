pub mod metrics;
pub mod monitor;

pub use metrics::IngestMetrics;
pub use monitor::{ingest_report, status_line};
