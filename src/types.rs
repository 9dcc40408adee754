//! Common types used throughout the Cekat nodes
//!
//! This module contains shared type definitions, type aliases,
//! and the output record every handler produces.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Output Records
// ============================================================================

/// Binary attachment carried by an output record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    /// Raw bytes
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Base64 copy of the bytes
    pub data: String,
    /// MIME type of the payload
    pub mime_type: String,
    /// File name offered to downstream nodes
    pub file_name: String,
}

impl BinaryData {
    /// Wrap raw bytes, computing the base64 copy
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Self {
            bytes,
            data,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }
}

/// One workflow item produced by a handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub json: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<BinaryData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_item: Option<usize>,
}

impl OutputRecord {
    /// Record holding only JSON
    pub fn new(json: JsonValue) -> Self {
        Self {
            json,
            binary: None,
            paired_item: None,
        }
    }

    /// Record paired with the input item it came from
    pub fn paired(json: JsonValue, item: usize) -> Self {
        Self {
            json,
            binary: None,
            paired_item: Some(item),
        }
    }

    /// Attach a binary payload
    pub fn with_binary(mut self, binary: BinaryData) -> Self {
        self.binary = Some(binary);
        self
    }

    /// Error-shaped record used when continue-on-fail captures a failure
    pub fn error(message: impl Into<String>, item: usize) -> Self {
        Self::paired(serde_json::json!({ "error": message.into() }), item)
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// JavaScript-style truthiness of a JSON value
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// JSON number for an `f64`; whole values become integers, non-finite becomes 0
pub fn number_to_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(JsonValue::from(0), JsonValue::Number)
    }
}

/// Render a JSON scalar the way string interpolation would
pub fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_conversion() {
        let get: reqwest::Method = Method::GET.into();
        assert_eq!(reqwest::Method::GET, get);
        let delete: reqwest::Method = Method::DELETE.into();
        assert_eq!(reqwest::Method::DELETE, delete);
        assert_eq!(Method::PUT.to_string(), "PUT");
    }

    #[test]
    fn test_error_record_shape() {
        let record = OutputRecord::error("boom", 1);
        assert_eq!(record.json, json!({"error": "boom"}));
        assert_eq!(record.paired_item, Some(1));
        assert!(record.binary.is_none());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = OutputRecord::paired(json!({"ok": true}), 0)
            .with_binary(BinaryData::new(b"hi".to_vec(), "text/plain", "a.txt"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["pairedItem"], json!(0));
        assert_eq!(value["binary"]["mimeType"], json!("text/plain"));
        assert_eq!(value["binary"]["data"], json!("aGk="));
        assert!(value["binary"].get("bytes").is_none());
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!([])));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&JsonValue::Null));
    }
}
