//! Platform-facing block descriptors.
//!
//! The registry turns every declared block into a [`ServiceBlock`] descriptor
//! that the transport collaborator forwards to the bridge platform. Events
//! and monitors are both presented as triggers; their display message gets a
//! trailing `". Set %1"` and a single output-variable argument bound to the
//! decoded pipe/poll value.
//!
//! Descriptors are plain data: `Clone` gives callers a deep copy, so nothing
//! handed out can mutate registry state.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::LoadError;

use super::spec::ArgumentSpec;

/// How the platform may invoke a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Asynchronous event source (pipe- or poll-fed).
    Trigger,
    /// Callable with side effects and a return value.
    Operation,
    /// Callable with read-only semantics expected.
    Getter,
}

/// Primitive value class of an argument.
///
/// The class table is closed; only strings are supported today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueClass {
    String,
}

/// One declared argument, resolved to its platform shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ArgumentDescriptor {
    /// Output variable receiving a trigger's decoded value.
    Variable { class: ValueClass },
    /// Plain typed input.
    Value { class: ValueClass, title: String },
    /// Input whose selectable values come from a registered data callback.
    Dynamic { class: ValueClass, callback: String },
}

/// Descriptor of one exposed block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceBlock {
    /// Block id, unique within the document.
    pub id: String,
    /// Remote function name; equal to the block id.
    pub function_name: String,
    /// Display message shown by the platform.
    pub message: String,
    /// Invocation style.
    pub kind: BlockKind,
    /// Arguments in positional order.
    pub arguments: Vec<ArgumentDescriptor>,
    /// Index of the argument receiving the trigger output, if any.
    pub save_to: Option<usize>,
}

/// Builds the trigger descriptor shared by event and monitor blocks.
///
/// The message has trailing `.`/space trimmed and `". Set %1"` appended; the
/// single output-variable argument receives the decoded value.
pub fn trigger_descriptor(id: &str, message: &str) -> ServiceBlock {
    let message = format!("{}. Set %1", message.trim_end_matches(['.', ' ']));
    ServiceBlock {
        id: id.to_owned(),
        function_name: id.to_owned(),
        message,
        kind: BlockKind::Trigger,
        arguments: vec![ArgumentDescriptor::Variable {
            class: ValueClass::String,
        }],
        save_to: Some(0),
    }
}

/// Resolves one declared argument, registering its data callback if needed.
///
/// Callback source documents are loaded eagerly, relative to the definition
/// document's directory, and stored under the derived key
/// `<block_id>_<title>`. Any structural problem fails the whole load.
pub fn build_argument(
    spec: &ArgumentSpec,
    block_id: &str,
    base_dir: &Path,
    callbacks: &mut HashMap<String, Value>,
) -> Result<ArgumentDescriptor, LoadError> {
    let class = match spec.class.as_str() {
        "string" => ValueClass::String,
        other => {
            return Err(LoadError::UnsupportedArgumentClass {
                block: block_id.to_owned(),
                class: other.to_owned(),
            })
        }
    };

    match spec.kind.as_str() {
        "value" => Ok(ArgumentDescriptor::Value {
            class,
            title: spec.title.clone(),
        }),
        "callback" => {
            let source_file =
                spec.source_file
                    .as_deref()
                    .ok_or_else(|| LoadError::MissingCallbackSource {
                        block: block_id.to_owned(),
                        title: spec.title.clone(),
                    })?;
            let path = base_dir.join(source_file);
            let text = std::fs::read_to_string(&path).map_err(|source| LoadError::CallbackIo {
                path: path.clone(),
                source,
            })?;
            let data: Value =
                serde_json::from_str(&text).map_err(|source| LoadError::CallbackParse {
                    path: path.clone(),
                    source,
                })?;

            let key = format!("{}_{}", block_id, spec.title);
            callbacks.insert(key.clone(), data);
            Ok(ArgumentDescriptor::Dynamic {
                class,
                callback: key,
            })
        }
        other => Err(LoadError::UnsupportedArgumentType {
            block: block_id.to_owned(),
            kind: other.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value_arg(kind: &str, class: &str, title: &str) -> ArgumentSpec {
        ArgumentSpec {
            kind: kind.to_owned(),
            class: class.to_owned(),
            title: title.to_owned(),
            source_file: None,
        }
    }

    #[test]
    fn test_trigger_message_is_trimmed_and_suffixed() {
        let block = trigger_descriptor("new_mail", "New mail arrived. ");
        assert_eq!(block.message, "New mail arrived. Set %1");
        assert_eq!(block.save_to, Some(0));
        assert_eq!(block.kind, BlockKind::Trigger);
        assert_eq!(
            block.arguments,
            vec![ArgumentDescriptor::Variable {
                class: ValueClass::String
            }]
        );
    }

    #[test]
    fn test_trigger_message_without_trailing_punctuation() {
        let block = trigger_descriptor("tick", "Clock ticked");
        assert_eq!(block.message, "Clock ticked. Set %1");
    }

    #[test]
    fn test_value_argument_resolves() {
        let mut callbacks = HashMap::new();
        let arg = build_argument(
            &value_arg("value", "string", "File name"),
            "note",
            Path::new("/tmp"),
            &mut callbacks,
        )
        .unwrap();
        assert_eq!(
            arg,
            ArgumentDescriptor::Value {
                class: ValueClass::String,
                title: "File name".to_owned()
            }
        );
        assert!(callbacks.is_empty());
    }

    #[test]
    fn test_unknown_argument_class_fails_load() {
        let mut callbacks = HashMap::new();
        let err = build_argument(
            &value_arg("value", "integer", "Count"),
            "note",
            Path::new("/tmp"),
            &mut callbacks,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedArgumentClass { .. }));
    }

    #[test]
    fn test_unknown_argument_type_fails_load() {
        let mut callbacks = HashMap::new();
        let err = build_argument(
            &value_arg("magic", "string", "Count"),
            "note",
            Path::new("/tmp"),
            &mut callbacks,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedArgumentType { .. }));
    }

    #[test]
    fn test_callback_argument_loads_source_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("choices.json"),
            r#"[{"id": "a", "name": "Alpha"}]"#,
        )
        .unwrap();

        let mut callbacks = HashMap::new();
        let spec = ArgumentSpec {
            kind: "callback".to_owned(),
            class: "string".to_owned(),
            title: "Choice".to_owned(),
            source_file: Some("choices.json".to_owned()),
        };
        let arg = build_argument(&spec, "pick", dir.path(), &mut callbacks).unwrap();

        assert_eq!(
            arg,
            ArgumentDescriptor::Dynamic {
                class: ValueClass::String,
                callback: "pick_Choice".to_owned()
            }
        );
        assert_eq!(
            callbacks.get("pick_Choice"),
            Some(&json!([{"id": "a", "name": "Alpha"}]))
        );
    }

    #[test]
    fn test_callback_without_source_file_fails_load() {
        let mut callbacks = HashMap::new();
        let err = build_argument(
            &value_arg("callback", "string", "Choice"),
            "pick",
            Path::new("/tmp"),
            &mut callbacks,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::MissingCallbackSource { .. }));
    }
}
