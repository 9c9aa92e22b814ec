pub mod inventory;
pub mod record;

pub use inventory::{InventorySnapshot, TagAggregator};
pub use record::{TagKey, TagRecord};
