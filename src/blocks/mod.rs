//! Declarative block model and platform descriptors.
//!
//! - [`BlockDocument`] — the definition document, loaded once.
//! - Spec types ([`EventSpec`], [`MonitorSpec`], [`OperationSpec`],
//!   [`ArgumentSpec`], [`CommandSpec`]) — the document shapes, untouched.
//! - [`ServiceBlock`] and friends — the resolved descriptors exposed to the
//!   bridge platform.

mod descriptor;
mod document;
mod spec;

pub use descriptor::{
    build_argument, trigger_descriptor, ArgumentDescriptor, BlockKind, ServiceBlock, ValueClass,
};
pub use document::BlockDocument;
pub use spec::{ArgumentSpec, CommandSpec, EventSpec, MonitorSpec, OperationSpec};
