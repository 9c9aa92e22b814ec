pub mod simulated;
pub mod traits;
pub mod types;

pub use simulated::SimulatedReader;
pub use traits::ReaderClient;
pub use types::{event_channel, ReaderCapabilities, ReaderEvent};
