//! Runtime configuration.
//!
//! Two values are threaded through component construction instead of living
//! in module-level globals:
//!
//! 1. [`RuntimePaths`] — where the block-definition document and the pipes
//!    directory live.
//! 2. [`Config`] — tunables for execution, dispatch, and shutdown.
//!
//! ## Sentinel values
//! - `exec_timeout = 0s` → no bound on child-process execution
//! - `dispatch_capacity` is clamped to a minimum of 1 by the dispatcher

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::runtime::RetryPolicy;

/// Filesystem layout of one bridge instance.
///
/// `base_dir` holds the block-definition document (`blocks.json`) and any
/// callback source documents, and is the working directory for every declared
/// command. `pipes_dir` holds one FIFO per event block.
#[derive(Clone, Debug)]
pub struct RuntimePaths {
    /// Base directory of the block-definition document.
    pub base_dir: PathBuf,
    /// Directory holding one FIFO per event block.
    pub pipes_dir: PathBuf,
}

impl RuntimePaths {
    /// Creates a layout rooted at `base_dir`, with pipes under
    /// `<base_dir>/pipes`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let pipes_dir = base_dir.join("pipes");
        Self {
            base_dir,
            pipes_dir,
        }
    }

    /// Overrides the pipes directory.
    pub fn with_pipes_dir(mut self, pipes_dir: impl Into<PathBuf>) -> Self {
        self.pipes_dir = pipes_dir.into();
        self
    }

    /// Path of the block-definition document.
    pub fn blocks_file(&self) -> PathBuf {
        self.base_dir.join("blocks.json")
    }

    /// Path of the FIFO backing the given event block.
    ///
    /// Block ids come from the trusted definition document and are assumed
    /// filesystem-safe; they are not sanitized here.
    pub fn pipe_path(&self, block_id: &str) -> PathBuf {
        self.pipes_dir.join(block_id)
    }

    /// Base directory as a path reference.
    pub fn base(&self) -> &Path {
        &self.base_dir
    }
}

/// Global configuration for the block runtime.
///
/// ## Field semantics
/// - `startup_grace`: wait before a monitor's first tick, so the host process
///   finishes initializing before external commands run
/// - `chunk_size`: bounded FIFO read size; one dispatch per non-empty chunk
/// - `exec_timeout`: bound on child-process execution (`0s` = unlimited)
/// - `dispatch_capacity`: bounded queue between event sources and the sink
/// - `grace`: maximum wait for sources to stop during shutdown
/// - `retry`: backoff applied when a failed event source is restarted
#[derive(Clone, Debug)]
pub struct Config {
    /// Delay before the first monitor tick.
    pub startup_grace: Duration,

    /// Maximum bytes per FIFO read.
    pub chunk_size: usize,

    /// Maximum time a declared command may run.
    ///
    /// `Duration::ZERO` disables the bound; a hung command then blocks its
    /// calling task indefinitely.
    pub exec_timeout: Duration,

    /// Capacity of the dispatch queue feeding the event sink.
    pub dispatch_capacity: usize,

    /// Maximum time to wait for sources to stop before reporting
    /// [`RuntimeError::GraceExceeded`](crate::RuntimeError::GraceExceeded).
    pub grace: Duration,

    /// Restart backoff for failed event sources.
    pub retry: RetryPolicy,
}

impl Config {
    /// Returns the command execution bound as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(d)` → timeout applied per invocation
    #[inline]
    pub fn command_timeout(&self) -> Option<Duration> {
        if self.exec_timeout == Duration::ZERO {
            None
        } else {
            Some(self.exec_timeout)
        }
    }

    /// Returns a dispatch capacity clamped to a minimum of 1.
    #[inline]
    pub fn dispatch_capacity_clamped(&self) -> usize {
        self.dispatch_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `startup_grace = 5s`
    /// - `chunk_size = 4096`
    /// - `exec_timeout = 30s`
    /// - `dispatch_capacity = 1024`
    /// - `grace = 30s`
    /// - `retry = RetryPolicy::default()`
    fn default() -> Self {
        Self {
            startup_grace: Duration::from_secs(5),
            chunk_size: 4096,
            exec_timeout: Duration::from_secs(30),
            dispatch_capacity: 1024,
            grace: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}
