pub mod sample;

pub use sample::{TagReport, TagSample, VendorData, RSSI_FLOOR};
