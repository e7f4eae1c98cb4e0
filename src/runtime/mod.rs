//! Runtime core: registry, dispatch, and supervision.
//!
//! - [`Registry`] — loads the block-definition document and answers remote
//!   calls and callback lookups.
//! - [`Dispatcher`] / [`DispatchWorker`] / [`EventSink`] — the single path
//!   from all event sources to the bridge transport.
//! - [`Supervisor`] — owns the source tasks, restarts failed ones with
//!   [`RetryPolicy`] backoff, and drives graceful shutdown.

mod backoff;
mod registry;
mod shutdown;
mod sink;
mod supervisor;

pub use backoff::RetryPolicy;
pub use registry::Registry;
pub use sink::{BlockEvent, DispatchWorker, Dispatcher, EventSink, LogSink};
pub use supervisor::Supervisor;
