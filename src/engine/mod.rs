pub mod runtime;

pub use runtime::{InventoryRuntime, RuntimeStatus};
