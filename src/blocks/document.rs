//! The block-definition document.

use std::path::Path;

use serde::Deserialize;

use crate::error::LoadError;

use super::spec::{EventSpec, MonitorSpec, OperationSpec};

/// Top-level shape of `blocks.json`.
///
/// Loaded once at startup and never mutated afterwards; it is the source of
/// truth for everything the registry builds. A missing file is fatal; a
/// missing top-level key defaults to an empty list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockDocument {
    /// Pipe-fed trigger blocks.
    #[serde(default)]
    pub events: Vec<EventSpec>,
    /// Command-polled trigger blocks.
    #[serde(default)]
    pub monitors: Vec<MonitorSpec>,
    /// Synchronously-callable blocks.
    #[serde(default)]
    pub operations: Vec<OperationSpec>,
}

impl BlockDocument {
    /// Reads and parses the document at `path`.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Document {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| LoadError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_keys_default_to_empty_lists() {
        let doc: BlockDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.events.is_empty());
        assert!(doc.monitors.is_empty());
        assert!(doc.operations.is_empty());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = BlockDocument::from_path(Path::new("/nonexistent/blocks.json")).unwrap_err();
        assert!(matches!(err, LoadError::Document { .. }));
    }
}
