//! Pipe event source: one FIFO per event block.
//!
//! State machine per instance:
//!
//! ```text
//! Created ──► AwaitingOpen ──► Reading ⇄ Reopening
//!                  │               │
//!                  └── cancel ─────┴──► done
//! ```
//!
//! - On start: ensure the pipes directory exists, create the FIFO if absent,
//!   then open it for reading. The open blocks until a writer connects (FIFO
//!   semantics), so it runs on a blocking thread and the task awaits it.
//! - Reading: bounded reads of `chunk_size` bytes. Every non-empty chunk is
//!   decoded (JSON, else raw text) and dispatched immediately — one dispatch
//!   per chunk, not per logical message. Producers that write several JSON
//!   documents per chunk, or split one across chunks, get raw-text
//!   passthrough; framing is their responsibility.
//! - A zero-length read means the writer closed: drop the handle, reopen
//!   (blocking for the next writer), continue. Never dispatches for a
//!   zero-length read.
//!
//! One source exclusively owns its FIFO for the process lifetime; sources
//! share nothing but the dispatcher.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::SourceError;
use crate::exec::Decoded;
use crate::runtime::Dispatcher;

use super::source::EventSource;

/// Reads one named pipe and dispatches every non-empty chunk.
pub struct PipeSource {
    id: Arc<str>,
    path: PathBuf,
    chunk_size: usize,
    dispatcher: Dispatcher,
}

impl PipeSource {
    /// Creates a source for `block_id` backed by the FIFO at `path`.
    pub fn new(
        block_id: &str,
        path: impl Into<PathBuf>,
        chunk_size: usize,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            id: Arc::from(block_id),
            path: path.into(),
            chunk_size: chunk_size.max(1),
            dispatcher,
        }
    }

    /// Path of the FIFO this source owns.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn pipe_err(&self, source: std::io::Error) -> SourceError {
        SourceError::Pipe {
            path: self.path.clone(),
            source,
        }
    }

    /// Creates the FIFO special file if it does not already exist.
    fn ensure_fifo(&self) -> Result<(), SourceError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| self.pipe_err(e))?;
        }
        // 0666 before umask, matching what shell `mkfifo` would create.
        let mode = Mode::S_IRUSR
            | Mode::S_IWUSR
            | Mode::S_IRGRP
            | Mode::S_IWGRP
            | Mode::S_IROTH
            | Mode::S_IWOTH;
        match mkfifo(&self.path, mode) {
            Ok(()) => Ok(()),
            Err(nix::errno::Errno::EEXIST) => Ok(()),
            Err(errno) => Err(self.pipe_err(std::io::Error::from_raw_os_error(errno as i32))),
        }
    }

    /// Opens the read end, blocking until a writer connects.
    ///
    /// Returns `None` on cancellation. The blocking open runs on a dedicated
    /// thread; if cancellation wins the race, that thread lingers until a
    /// writer connects and its handle is dropped unread — acceptable, the
    /// process is shutting down.
    async fn open(&self, ctx: &CancellationToken) -> Result<Option<pipe::Receiver>, SourceError> {
        debug!(pipe = %self.path.display(), "waiting for writer");
        let path = self.path.clone();
        let open = task::spawn_blocking(move || std::fs::File::open(path));
        tokio::pin!(open);

        tokio::select! {
            _ = ctx.cancelled() => Ok(None),
            joined = &mut open => {
                let file = joined
                    .map_err(|e| self.pipe_err(std::io::Error::other(e)))?
                    .map_err(|e| self.pipe_err(e))?;
                let rx = pipe::Receiver::from_file(file).map_err(|e| self.pipe_err(e))?;
                debug!(pipe = %self.path.display(), "opened");
                Ok(Some(rx))
            }
        }
    }
}

#[async_trait]
impl EventSource for PipeSource {
    fn name(&self) -> &str {
        &self.id
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), SourceError> {
        self.ensure_fifo()?;

        let mut rx = match self.open(&ctx).await? {
            Some(rx) => rx,
            None => return Ok(()),
        };
        let mut buf = vec![0u8; self.chunk_size];

        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Ok(()),
                read = rx.read(&mut buf) => match read {
                    // Writer closed; the old handle drops before the reopen.
                    Ok(0) => {
                        debug!(pipe = %self.path.display(), "writer closed, reopening");
                        rx = match self.open(&ctx).await? {
                            Some(next) => next,
                            None => return Ok(()),
                        };
                    }
                    Ok(n) => {
                        let text = String::from_utf8_lossy(&buf[..n]);
                        trace!(pipe = %self.path.display(), bytes = n, "chunk");
                        self.dispatcher
                            .dispatch(self.id.clone(), Decoded::parse(&text))
                            .await;
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(self.pipe_err(e)),
                },
            }
        }
    }
}
