//! # unix-bridge
//!
//! **unix-bridge** exposes Unix-level event sources (named pipes,
//! periodically-polled shell commands) and command-backed operations as a
//! uniform set of typed blocks for an external automation platform.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     blocks.json (declarative block definitions)
//!          │
//!          ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Registry (built once at load)                                │
//! │  - trigger descriptors for events and monitors                │
//! │  - operation/getter function table                            │
//! │  - eagerly-loaded data-callback table                         │
//! └──────┬──────────────────┬─────────────────────────┬───────────┘
//!        ▼                  ▼                         │
//! ┌──────────────┐   ┌──────────────┐                 │ handle_call /
//! │  PipeSource  │   │  PollSource  │                 │ handle_data_callback
//! │ (one / event │   │(one / monitor│                 ▼
//! │  block FIFO) │   │    block)    │          ┌──────────────┐
//! └──────┬───────┘   └──────┬───────┘          │ CommandRunner│
//!        │ decoded chunks   │ decoded ticks    │ (child proc, │
//!        ▼                  ▼                  │  $N subst)   │
//! ┌───────────────────────────────────┐        └──────────────┘
//! │  Dispatcher (bounded queue)       │
//! │    └─► DispatchWorker (serial)    │
//! │          └─► EventSink (transport)│
//! └───────────────────────────────────┘
//! ```
//!
//! Every pipe and poll source runs as its own task under the [`Supervisor`],
//! which restarts failed sources with backoff and drives cooperative
//! shutdown with a grace period.
//!
//! ## Scope
//! The transport that talks to the remote platform (authentication, wire
//! protocol) is a collaborator, not part of this crate: it implements
//! [`EventSink`] to receive events and calls
//! [`Registry::handle_call`]/[`Registry::handle_data_callback`] for remote
//! invocations.
//!
//! ## Known limitation
//! Pipe payloads are dispatched one chunk per read with no message framing.
//! A producer that splits one JSON document across two writes, or packs
//! several documents into one, gets raw-text passthrough instead of
//! structured values.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use unix_bridge::{Config, Dispatcher, LogSink, Registry, RuntimePaths, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let paths = RuntimePaths::new("/var/lib/unix-bridge");
//!     let cfg = Config::default();
//!
//!     let (dispatcher, worker) = Dispatcher::channel(cfg.dispatch_capacity_clamped());
//!     let mut registry = Registry::load(&paths, &cfg, dispatcher)?;
//!     let sources = registry.take_sources();
//!
//!     // A real deployment passes its transport here instead of LogSink.
//!     let supervisor = Supervisor::new(cfg);
//!     supervisor.run(sources, worker, Arc::new(LogSink::new())).await?;
//!     Ok(())
//! }
//! ```

#![cfg(unix)]

pub mod blocks;
pub mod config;
pub mod error;
pub mod exec;
pub mod runtime;
pub mod sources;

pub use blocks::{
    ArgumentDescriptor, ArgumentSpec, BlockDocument, BlockKind, CommandSpec, EventSpec,
    MonitorSpec, OperationSpec, ServiceBlock, ValueClass,
};
pub use config::{Config, RuntimePaths};
pub use error::{CallError, ExecError, FrequencyError, LoadError, RuntimeError, SourceError};
pub use exec::{parse_frequency, CommandRunner, Decoded};
pub use runtime::{
    BlockEvent, DispatchWorker, Dispatcher, EventSink, LogSink, Registry, RetryPolicy, Supervisor,
};
pub use sources::{EventSource, PipeSource, PollSource, SourceRef};
