//! Event dispatch: the single path from all sources to the bridge transport.
//!
//! ```text
//! Producers (many):                       Consumer (one):
//!   PipeSource 1 ──┐
//!   PipeSource 2 ──┼──► Dispatcher ────► DispatchWorker ────► EventSink
//!   PollSource N ──┘   (bounded mpsc)     (serial loop)      (transport)
//! ```
//!
//! ## Rules
//! - The sink is never invoked concurrently: one worker consumes the queue
//!   and awaits each `emit_event` call before taking the next.
//! - Within a single source, dispatch order equals read/tick order; no order
//!   is promised between sources.
//! - `dispatch` awaits queue capacity, so a slow sink applies backpressure to
//!   sources instead of dropping events.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::exec::Decoded;

/// One decoded value captured by an event source.
#[derive(Debug, Clone)]
pub struct BlockEvent {
    /// Id of the block that produced the value.
    pub block_id: Arc<str>,
    /// The decoded payload.
    pub value: Decoded,
}

/// Delivery point for decoded events, implemented by the transport
/// collaborator.
///
/// Requiring the method (no default body) makes the override contract a
/// compile-time obligation rather than a runtime "must be overridden" error.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    /// Delivers one decoded event upstream.
    async fn emit_event(&self, block_id: &str, value: Decoded);
}

/// Sink that logs events instead of delivering them anywhere.
///
/// Useful for demos and for running a bridge before its transport exists.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// Constructs a new [`LogSink`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for LogSink {
    async fn emit_event(&self, block_id: &str, value: Decoded) {
        info!(block = block_id, value = ?value, "event");
    }
}

/// Clone-able producer handle used by every event source.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    tx: mpsc::Sender<BlockEvent>,
}

impl Dispatcher {
    /// Creates a dispatcher and its consuming worker.
    ///
    /// `capacity` is clamped to a minimum of 1.
    pub fn channel(capacity: usize) -> (Dispatcher, DispatchWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Dispatcher { tx }, DispatchWorker { rx })
    }

    /// Queues one event for delivery, waiting for capacity if needed.
    ///
    /// A closed queue (worker gone during shutdown) drops the event with a
    /// warning; sources keep running and observe cancellation themselves.
    pub async fn dispatch(&self, block_id: Arc<str>, value: Decoded) {
        let event = BlockEvent { block_id, value };
        if let Err(e) = self.tx.send(event).await {
            warn!(block = %e.0.block_id, "dispatch queue closed; event dropped");
        }
    }
}

/// Consumes the dispatch queue and feeds the sink serially.
pub struct DispatchWorker {
    rx: mpsc::Receiver<BlockEvent>,
}

impl DispatchWorker {
    /// Runs until every [`Dispatcher`] handle is dropped, then drains and
    /// returns.
    pub async fn run(mut self, sink: Arc<dyn EventSink>) {
        while let Some(event) = self.rx.recv().await {
            sink.emit_event(&event.block_id, event.value).await;
        }
    }
}
