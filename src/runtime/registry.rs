//! Block registry: loads the definition document and wires everything up.
//!
//! ```text
//! blocks.json ──► Registry::load(paths, cfg, dispatcher)
//!     │
//!     ├─ events[]     ──► PipeSource  + trigger descriptor
//!     ├─ monitors[]   ──► PollSource  + trigger descriptor
//!     └─ operations[] ──► function table entry + operation/getter descriptor
//!                          (callback arguments load their source documents
//!                           eagerly into the callback table)
//!
//! Remote calls:
//!   handle_call(name, args, extra) ──► function table ──► CommandRunner
//!   handle_data_callback(name, extra) ──► callback table
//! ```
//!
//! ## Rules
//! - The document is parsed exactly once; the registry is immutable after
//!   load (tables are built once and only queried afterwards).
//! - The pipes directory is cleaned before any source is constructed, so no
//!   source can race the cleanup or resume a previous process's pipe state.
//! - Any structural problem in the document aborts the load; nothing is
//!   started half-way.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::blocks::{
    build_argument, trigger_descriptor, BlockDocument, BlockKind, CommandSpec, ServiceBlock,
};
use crate::config::{Config, RuntimePaths};
use crate::error::{CallError, LoadError};
use crate::exec::{parse_frequency, CommandRunner, Decoded};
use crate::sources::{PipeSource, PollSource, SourceRef};

use super::sink::Dispatcher;

/// A callable registered under a block id.
///
/// Operations and getters share the execution path; the variant records how
/// the block was declared so the distinction stays queryable.
#[derive(Debug, Clone)]
enum RegisteredFunction {
    Operation { command: CommandSpec },
    Getter { command: CommandSpec },
}

impl RegisteredFunction {
    fn command(&self) -> &CommandSpec {
        match self {
            RegisteredFunction::Operation { command } => command,
            RegisteredFunction::Getter { command } => command,
        }
    }
}

/// The loaded block registry.
///
/// Built once from the definition document; afterwards it only answers
/// queries (`service_blocks`, `handle_call`, `handle_data_callback`). The
/// event sources it builds are handed to the supervisor via
/// [`Registry::take_sources`].
pub struct Registry {
    blocks: Vec<ServiceBlock>,
    functions: HashMap<String, RegisteredFunction>,
    callbacks: HashMap<String, Value>,
    sources: Vec<SourceRef>,
    runner: CommandRunner,
}

impl std::fmt::Debug for Registry {
    // Sources are trait objects; summarize instead of deriving.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("blocks", &self.blocks.len())
            .field("functions", &self.functions.len())
            .field("callbacks", &self.callbacks.len())
            .field("sources", &self.sources.len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Parses the document under `paths` and builds the registry.
    ///
    /// Duplicate block ids are not rejected; a later entry overwrites the
    /// earlier one in the function table, matching the document's "unique
    /// within the document" contract being the author's responsibility.
    pub fn load(
        paths: &RuntimePaths,
        cfg: &Config,
        dispatcher: Dispatcher,
    ) -> Result<Self, LoadError> {
        let document_path = paths.blocks_file();
        let document = BlockDocument::from_path(&document_path)?;
        info!(
            document = %document_path.display(),
            events = document.events.len(),
            monitors = document.monitors.len(),
            operations = document.operations.len(),
            "loading block document"
        );

        // Clean slate before any source exists: stale FIFOs from a previous,
        // possibly crashed, process must never be read.
        remove_old_pipes(paths)?;

        let runner = CommandRunner::new(&paths.base_dir, cfg.command_timeout());
        let mut blocks = Vec::new();
        let mut functions = HashMap::new();
        let mut callbacks = HashMap::new();
        let mut sources: Vec<SourceRef> = Vec::new();

        for event in &document.events {
            debug!(block = %event.id, "event block -> pipe source");
            sources.push(Arc::new(PipeSource::new(
                &event.id,
                paths.pipe_path(&event.id),
                cfg.chunk_size,
                dispatcher.clone(),
            )));
            blocks.push(trigger_descriptor(&event.id, &event.message));
        }

        for monitor in &document.monitors {
            let frequency =
                parse_frequency(&monitor.frequency).map_err(|source| LoadError::Frequency {
                    block: monitor.id.clone(),
                    source,
                })?;
            debug!(block = %monitor.id, ?frequency, "monitor block -> poll source");
            sources.push(Arc::new(PollSource::new(
                &monitor.id,
                monitor.command.clone(),
                frequency,
                cfg.startup_grace,
                runner.clone(),
                dispatcher.clone(),
            )));
            blocks.push(trigger_descriptor(&monitor.id, &monitor.message));
        }

        for operation in &document.operations {
            let (kind, function) = match operation.kind.as_str() {
                "operation" => (
                    BlockKind::Operation,
                    RegisteredFunction::Operation {
                        command: operation.command.clone(),
                    },
                ),
                "getter" => (
                    BlockKind::Getter,
                    RegisteredFunction::Getter {
                        command: operation.command.clone(),
                    },
                ),
                other => {
                    return Err(LoadError::UnsupportedBlockType {
                        block: operation.id.clone(),
                        kind: other.to_owned(),
                    })
                }
            };

            let mut arguments = Vec::with_capacity(operation.arguments.len());
            for argument in &operation.arguments {
                arguments.push(build_argument(
                    argument,
                    &operation.id,
                    paths.base(),
                    &mut callbacks,
                )?);
            }

            debug!(block = %operation.id, ?kind, "operation block -> function table");
            functions.insert(operation.id.clone(), function);
            blocks.push(ServiceBlock {
                id: operation.id.clone(),
                function_name: operation.id.clone(),
                message: operation.message.clone(),
                kind,
                arguments,
                save_to: None,
            });
        }

        Ok(Self {
            blocks,
            functions,
            callbacks,
            sources,
            runner,
        })
    }

    /// Returns a deep copy of all built descriptors.
    ///
    /// The returned value is independent of the registry; mutating it cannot
    /// affect later calls.
    pub fn service_blocks(&self) -> Vec<ServiceBlock> {
        self.blocks.clone()
    }

    /// Invokes the operation/getter registered under `name`.
    ///
    /// `extra` is transport metadata the runtime does not consult; it is part
    /// of the call interface for forward compatibility.
    pub async fn handle_call(
        &self,
        name: &str,
        args: &[Value],
        _extra: Option<&Value>,
    ) -> Result<Decoded, CallError> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| CallError::UnknownFunction {
                name: name.to_owned(),
            })?;
        Ok(self.runner.run(function.command(), args).await?)
    }

    /// Returns the selectable-values document registered under `name`.
    pub fn handle_data_callback(
        &self,
        name: &str,
        _extra: Option<&Value>,
    ) -> Result<Value, CallError> {
        self.callbacks
            .get(name)
            .cloned()
            .ok_or_else(|| CallError::UnknownCallback {
                name: name.to_owned(),
            })
    }

    /// Hands the built event sources to the supervisor.
    ///
    /// Subsequent calls return an empty vector.
    pub fn take_sources(&mut self) -> Vec<SourceRef> {
        std::mem::take(&mut self.sources)
    }
}

/// Removes every pre-existing file in the pipes directory.
fn remove_old_pipes(paths: &RuntimePaths) -> Result<(), LoadError> {
    let dir = &paths.pipes_dir;
    let pipes_err = |source: std::io::Error| LoadError::PipesDir {
        path: dir.clone(),
        source,
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(pipes_err(e)),
    };
    for entry in entries {
        let entry = entry.map_err(pipes_err)?;
        debug!(pipe = %entry.path().display(), "removing stale pipe");
        std::fs::remove_file(entry.path()).map_err(pipes_err)?;
    }
    Ok(())
}
