//! Declared block shapes, as they appear in the definition document.
//!
//! These types mirror the document JSON one-to-one and stay untyped where the
//! document is stringly-typed (`type`, `class`): resolution to the closed
//! sets the runtime supports happens in the descriptor builder, so that a bad
//! entry fails load with a named error instead of a generic decode error.

use serde::Deserialize;
use serde_json::Value;

/// A declared command: either pre-split tokens or one shell-syntax line.
///
/// Token lists may contain non-string JSON values; they are string-coerced at
/// invocation time. Single strings are split with shell-word rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    /// Pre-tokenized command, e.g. `["grep", "$1", "notes.txt"]`.
    Tokens(Vec<Value>),
    /// One shell-syntax string, e.g. `"grep \"two words\" $1"`.
    Line(String),
}

/// A declared argument of an operation or getter block.
#[derive(Debug, Clone, Deserialize)]
pub struct ArgumentSpec {
    /// `"value"` or `"callback"`; anything else fails load.
    #[serde(rename = "type")]
    pub kind: String,
    /// Value class; only `"string"` is supported.
    pub class: String,
    /// Human-readable argument title; also part of the derived callback key.
    pub title: String,
    /// For callback arguments: JSON document of selectable values, relative
    /// to the definition document's directory.
    #[serde(default)]
    pub source_file: Option<String>,
}

/// An asynchronous trigger fed by a named pipe.
///
/// The runtime never invokes a command for these; the pipe is the event
/// source. A declared `command` is carried but unused by this path.
#[derive(Debug, Clone, Deserialize)]
pub struct EventSpec {
    /// Unique block id; also the FIFO file name.
    pub id: String,
    /// Display message template.
    pub message: String,
    /// Unused by the pipe path; kept for document fidelity.
    #[serde(default)]
    pub command: Option<CommandSpec>,
}

/// A trigger backed by a periodically-invoked command.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSpec {
    /// Unique block id.
    pub id: String,
    /// Display message template.
    pub message: String,
    /// Command invoked on every tick, with no positional arguments.
    pub command: CommandSpec,
    /// Tick interval as a compact duration string.
    #[serde(default = "default_frequency")]
    pub frequency: String,
}

fn default_frequency() -> String {
    "1m".to_owned()
}

/// A synchronously-callable block (operation or getter).
#[derive(Debug, Clone, Deserialize)]
pub struct OperationSpec {
    /// Unique block id; also the remote function name.
    pub id: String,
    /// Display message template.
    pub message: String,
    /// Command invoked per remote call.
    pub command: CommandSpec,
    /// `"operation"` or `"getter"`; anything else fails load.
    #[serde(rename = "type", default = "default_operation_kind")]
    pub kind: String,
    /// Declared arguments, in positional order.
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
}

fn default_operation_kind() -> String {
    "operation".to_owned()
}
