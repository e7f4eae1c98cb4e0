//! Concurrent event sources.
//!
//! One source runs per declared event block ([`PipeSource`]) and per declared
//! monitor block ([`PollSource`]). Each owns its own task of control for the
//! process lifetime and shares nothing with its peers except the dispatcher.

mod pipe;
mod poll;
mod source;

pub use pipe::PipeSource;
pub use poll::PollSource;
pub use source::{EventSource, SourceRef};
