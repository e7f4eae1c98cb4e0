//! Polling event source: one periodically-invoked command per monitor block.
//!
//! ```text
//! start ──► sleep(startup_grace) ──► loop {
//!             run command ─► trim ─► decode ─► dispatch
//!             sleep(frequency)
//!           }
//! ```
//!
//! ## Rules
//! - The startup grace lets the host process finish initializing before any
//!   external command runs.
//! - A failed tick is logged and skipped; it must never stop the loop.
//! - Raw text output is whitespace-trimmed and re-decoded, so `"42\n"` and
//!   `" ok "` arrive as the value `42` and the text `"ok"`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::blocks::CommandSpec;
use crate::error::SourceError;
use crate::exec::{CommandRunner, Decoded};
use crate::runtime::Dispatcher;

use super::source::EventSource;

/// Invokes one command on a fixed interval and dispatches the result.
pub struct PollSource {
    id: Arc<str>,
    command: CommandSpec,
    frequency: Duration,
    startup_grace: Duration,
    runner: CommandRunner,
    dispatcher: Dispatcher,
}

impl PollSource {
    /// Creates a source ticking `command` every `frequency`.
    pub fn new(
        block_id: &str,
        command: CommandSpec,
        frequency: Duration,
        startup_grace: Duration,
        runner: CommandRunner,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            id: Arc::from(block_id),
            command,
            frequency,
            startup_grace,
            runner,
            dispatcher,
        }
    }

    /// Runs one tick: invoke, normalize, dispatch.
    async fn tick(&self) {
        match self.runner.run(&self.command, &[]).await {
            Ok(decoded) => {
                let value = normalize(decoded);
                debug!(block = %self.id, value = ?value, "monitor tick");
                self.dispatcher.dispatch(self.id.clone(), value).await;
            }
            Err(e) => {
                warn!(
                    block = %self.id,
                    error = %e,
                    label = e.as_label(),
                    "monitor tick failed; continuing"
                );
            }
        }
    }
}

/// Trims raw text and re-attempts the decode; structured values pass through.
fn normalize(decoded: Decoded) -> Decoded {
    match decoded {
        Decoded::Raw(text) => Decoded::parse(text.trim()),
        structured => structured,
    }
}

#[async_trait]
impl EventSource for PollSource {
    fn name(&self) -> &str {
        &self.id
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), SourceError> {
        debug!(
            block = %self.id,
            every = ?self.frequency,
            grace = ?self.startup_grace,
            "monitor starting"
        );
        let grace = time::sleep(self.startup_grace);
        tokio::pin!(grace);
        tokio::select! {
            _ = ctx.cancelled() => return Ok(()),
            _ = &mut grace => {}
        }

        loop {
            self.tick().await;

            let pause = time::sleep(self.frequency);
            tokio::pin!(pause);
            tokio::select! {
                _ = ctx.cancelled() => return Ok(()),
                _ = &mut pause => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_trims_then_redecodes() {
        assert_eq!(
            normalize(Decoded::Raw("  42 \n".to_owned())),
            Decoded::Structured(json!(42))
        );
        assert_eq!(
            normalize(Decoded::Raw(" ok \n".to_owned())),
            Decoded::Raw("ok".to_owned())
        );
        assert_eq!(
            normalize(Decoded::Structured(json!({"up": true}))),
            Decoded::Structured(json!({"up": true}))
        );
    }
}
