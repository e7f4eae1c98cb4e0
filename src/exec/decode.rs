//! Decode-or-passthrough for captured text.
//!
//! Command output and pipe payloads are either JSON or free-form text, and
//! producers do not declare which. [`Decoded`] makes the two cases explicit
//! instead of leaning on parse failures as the discriminator.
//!
//! ## Rules
//! - Valid JSON text always decodes to the equivalent structured value.
//! - Any non-JSON text passes through unchanged (identity on invalid JSON).

use serde::Serialize;
use serde_json::Value;

/// Result of decoding a captured payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Decoded {
    /// The payload parsed as JSON.
    Structured(Value),
    /// The payload is forwarded as plain text.
    Raw(String),
}

impl Decoded {
    /// Decodes `text` as JSON, falling back to raw passthrough.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Decoded::Structured(value),
            Err(_) => Decoded::Raw(text.to_owned()),
        }
    }

    /// Returns the payload as a JSON value, wrapping raw text in a string.
    pub fn into_value(self) -> Value {
        match self {
            Decoded::Structured(value) => value,
            Decoded::Raw(text) => Value::String(text),
        }
    }

    /// True if the payload parsed as JSON.
    #[inline]
    pub fn is_structured(&self) -> bool {
        matches!(self, Decoded::Structured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_decodes_to_equivalent_value() {
        assert_eq!(Decoded::parse("5"), Decoded::Structured(json!(5)));
        assert_eq!(
            Decoded::parse(r#"{"a": [1, 2]}"#),
            Decoded::Structured(json!({"a": [1, 2]}))
        );
        assert_eq!(Decoded::parse("\"hi\"\n"), Decoded::Structured(json!("hi")));
    }

    #[test]
    fn invalid_json_is_identity() {
        for text in ["hello world", "", "{not json", "up 3 days"] {
            assert_eq!(Decoded::parse(text), Decoded::Raw(text.to_owned()));
        }
    }

    #[test]
    fn into_value_wraps_raw_text() {
        assert_eq!(
            Decoded::Raw("plain".to_owned()).into_value(),
            json!("plain")
        );
        assert_eq!(Decoded::Structured(json!(true)).into_value(), json!(true));
    }
}
