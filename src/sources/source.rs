//! Event-source abstraction.
//!
//! An event source is a long-lived, cancelable unit: it produces decoded
//! values for one block until the runtime token is cancelled. Sources are
//! spawned and restarted by the [`Supervisor`](crate::runtime::Supervisor).

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;

/// # Long-lived, cancelable producer of block events.
///
/// Implementations should observe `ctx` at their await points and return
/// `Ok(())` promptly once it is cancelled. An `Err` return means the source
/// hit an unrecoverable I/O problem and wants to be restarted.
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    /// Returns the id of the block this source feeds.
    fn name(&self) -> &str;

    /// Runs the source until cancellation (`Ok`) or an unrecoverable
    /// failure (`Err`).
    async fn run(&self, ctx: CancellationToken) -> Result<(), SourceError>;
}

/// Shared handle to an event source.
pub type SourceRef = Arc<dyn EventSource>;
