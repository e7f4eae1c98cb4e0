//! Command execution and payload decoding.
//!
//! - [`CommandRunner`] — resolves a declared command template and invokes it
//!   as a child process.
//! - [`Decoded`] — explicit decode-or-passthrough result for captured text.
//! - [`parse_frequency`] — compact duration strings for monitor frequencies.

mod command;
mod decode;
mod frequency;

pub use command::{resolve_command, CommandRunner};
pub use decode::Decoded;
pub use frequency::parse_frequency;
