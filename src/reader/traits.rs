use anyhow::Result;
use async_trait::async_trait;

use super::types::ReaderCapabilities;

/// Boundary trait for reader clients.
///
/// Implementations own the wire protocol and deliver `ReaderEvent`s over
/// the channel handed to them at construction; the core never blocks on
/// reader I/O.
#[async_trait]
pub trait ReaderClient: Send + Sync {
    /// Ask the reader to start an inventory round.
    async fn start_inventory(&mut self) -> Result<()>;

    /// Ask the reader to stop inventorying.
    async fn stop_inventory(&mut self) -> Result<()>;

    /// Capabilities parsed from the reader after connect.
    fn capabilities(&self) -> ReaderCapabilities;

    fn is_connected(&self) -> bool;
}
