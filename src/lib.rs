pub mod aggregator;
pub mod core;
pub mod engine;
pub mod observability;
pub mod phase;
pub mod rate;
pub mod reader;
