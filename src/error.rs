//! Error types used by the block runtime.
//!
//! The taxonomy follows the failure policy of the runtime:
//!
//! - [`LoadError`] — structural problems in the block-definition document.
//!   Always fatal at load time: a half-initialized registry with some event
//!   sources running and others missing is unacceptable.
//! - [`ExecError`] — a declared command could not be resolved, spawned, or
//!   finished unsuccessfully.
//! - [`CallError`] — a remote function or data-callback invocation failed.
//!   Surfaced to the caller of that request, never fatal to the process.
//! - [`SourceError`] — an event source hit an unrecoverable I/O problem and
//!   must be restarted by the supervisor.
//! - [`RuntimeError`] — failures of the orchestration itself (shutdown grace
//!   exceeded).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Malformed frequency string (e.g. `"5"` or `"m5"` instead of `"5m"`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed frequency '{value}': expected <digits><s|m|h|d>")]
pub struct FrequencyError {
    /// The rejected input.
    pub value: String,
}

/// # Errors raised while loading the block-definition document.
///
/// All of these abort startup. The offending document entry is named in the
/// message so a misconfigured block can be found without a debugger.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LoadError {
    /// The document could not be read from disk.
    #[error("cannot read block document {path}: {source}")]
    Document {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not match the expected shape.
    #[error("malformed block document {path}: {source}")]
    Parse {
        /// Path of the document.
        path: PathBuf,
        /// Underlying decode error.
        source: serde_json::Error,
    },

    /// An operation block declared a `type` other than `operation`/`getter`.
    #[error("block '{block}': unsupported block type '{kind}'")]
    UnsupportedBlockType { block: String, kind: String },

    /// An argument declared a `type` other than `value`/`callback`.
    #[error("block '{block}': unsupported argument type '{kind}'")]
    UnsupportedArgumentType { block: String, kind: String },

    /// An argument declared a `class` with no known value-type mapping.
    #[error("block '{block}': unsupported argument class '{class}'")]
    UnsupportedArgumentClass { block: String, class: String },

    /// A callback argument did not name a `source_file`.
    #[error("block '{block}': callback argument '{title}' has no source_file")]
    MissingCallbackSource { block: String, title: String },

    /// A callback source document could not be read.
    #[error("cannot read callback document {path}: {source}")]
    CallbackIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A callback source document is not valid JSON.
    #[error("malformed callback document {path}: {source}")]
    CallbackParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A monitor block declared a frequency the parser rejects.
    #[error("block '{block}': {source}")]
    Frequency {
        block: String,
        source: FrequencyError,
    },

    /// Stale pipes from a previous run could not be removed.
    #[error("cannot reset pipes directory {path}: {source}")]
    PipesDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// # Errors raised while executing a declared command.
///
/// Operation/getter calls propagate these to the caller; monitor ticks log
/// them and continue with the next tick.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExecError {
    /// The command resolved to zero tokens.
    #[error("empty command")]
    EmptyCommand,

    /// A single-string command has invalid shell quoting.
    #[error("bad shell syntax: {0}")]
    Shell(#[from] shell_words::ParseError),

    /// A `$N` placeholder referenced an argument the caller did not supply.
    #[error("missing positional argument ${index}")]
    MissingArgument { index: usize },

    /// The child process could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The child process exited with a non-zero status.
    #[error("command exited with status {code:?}")]
    Failed {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard output up to the failure.
        stdout: String,
    },

    /// The child process did not finish within the configured bound.
    #[error("command timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Captured standard output was not valid UTF-8.
    #[error("command produced non-UTF-8 output")]
    NonUtf8,
}

impl ExecError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecError::EmptyCommand => "exec_empty_command",
            ExecError::Shell(_) => "exec_shell_syntax",
            ExecError::MissingArgument { .. } => "exec_missing_argument",
            ExecError::Spawn { .. } => "exec_spawn",
            ExecError::Failed { .. } => "exec_failed",
            ExecError::Timeout { .. } => "exec_timeout",
            ExecError::NonUtf8 => "exec_non_utf8",
        }
    }
}

/// # Errors surfaced to the transport collaborator on a remote call.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CallError {
    /// No operation/getter block is registered under this function name.
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    /// No data callback is registered under this name.
    #[error("unknown callback '{name}'")]
    UnknownCallback { name: String },

    /// The block's command failed; carries the execution detail.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// # Unrecoverable event-source failures.
///
/// A source that returns one of these is restarted by the supervisor after a
/// backoff delay; per-read problems (bad payloads, writer close) are handled
/// inside the source loop and never reach this type.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SourceError {
    /// FIFO creation, open, or read failed.
    #[error("pipe {path}: {source}")]
    Pipe {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// # Errors produced by the runtime orchestration itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some sources remained stuck.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the sources that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}
