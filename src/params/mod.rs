//! Per-item parameter access
//!
//! A host supplies node parameters item by item. Handlers read them through
//! [`ParameterSource`] and the typed getters in [`ParameterSourceExt`].
//! Names may be dotted (`additionalFields.pollingInterval`) to reach into
//! collection parameters.

use crate::error::{Error, Result};
use crate::types::{is_truthy, value_to_string, JsonObject, JsonValue};

/// Host-provided parameter accessor
pub trait ParameterSource: Send + Sync {
    /// Number of input items
    fn item_count(&self) -> usize;

    /// Raw parameter value for an item, `None` when not set
    fn parameter(&self, name: &str, item: usize) -> Option<JsonValue>;
}

/// Typed getters over any [`ParameterSource`]
pub trait ParameterSourceExt: ParameterSource {
    /// Required string parameter; absent or empty is `MissingParameter`
    fn required_str(&self, name: &str, item: usize) -> Result<String> {
        self.opt_str(name, item)
            .ok_or_else(|| Error::missing_param(name, item))
    }

    /// Non-empty string parameter, if set
    fn opt_str(&self, name: &str, item: usize) -> Option<String> {
        self.parameter(name, item)
            .map(|v| value_to_string(&v))
            .filter(|s| !s.is_empty())
    }

    /// String parameter with a default for absent values
    fn str_or(&self, name: &str, item: usize, default: &str) -> String {
        match self.parameter(name, item) {
            Some(JsonValue::Null) | None => default.to_string(),
            Some(v) => value_to_string(&v),
        }
    }

    /// Boolean parameter; strings `"true"`/`"false"` are accepted
    fn bool_or(&self, name: &str, item: usize, default: bool) -> bool {
        match self.parameter(name, item) {
            None | Some(JsonValue::Null) => default,
            Some(JsonValue::String(s)) if s.eq_ignore_ascii_case("false") => false,
            Some(v) => is_truthy(&v),
        }
    }

    /// Numeric parameter; numeric strings are accepted
    fn f64_or(&self, name: &str, item: usize, default: f64) -> f64 {
        match self.parameter(name, item) {
            Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(default),
            Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Object parameter, empty when absent or not an object
    fn object_or_empty(&self, name: &str, item: usize) -> JsonObject {
        match self.parameter(name, item) {
            Some(JsonValue::Object(map)) => map,
            _ => JsonObject::new(),
        }
    }

    /// Array parameter, empty when absent or not an array
    fn array_or_empty(&self, name: &str, item: usize) -> Vec<JsonValue> {
        match self.parameter(name, item) {
            Some(JsonValue::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    /// Parameter holding JSON, either inline or as a JSON string
    ///
    /// Returns `None` for absent or blank values and `InvalidParameter`
    /// when a string does not parse.
    fn json_value(&self, name: &str, item: usize) -> Result<Option<JsonValue>> {
        match self.parameter(name, item) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(s)) => {
                if s.trim().is_empty() {
                    return Ok(None);
                }
                serde_json::from_str(&s)
                    .map(Some)
                    .map_err(|e| Error::invalid_param(name, format!("invalid JSON: {e}")))
            }
            Some(other) => Ok(Some(other)),
        }
    }
}

impl<T: ParameterSource + ?Sized> ParameterSourceExt for T {}

/// Parameters as one JSON object per input item
#[derive(Debug, Clone, Default)]
pub struct ItemParameters {
    items: Vec<JsonObject>,
}

impl ItemParameters {
    pub fn new(items: Vec<JsonObject>) -> Self {
        Self { items }
    }

    /// Single-item parameters
    pub fn single(params: JsonObject) -> Self {
        Self {
            items: vec![params],
        }
    }

    /// Parse a JSON array of objects (or one object) into item parameters
    pub fn from_json(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Array(values) => values
                .into_iter()
                .enumerate()
                .map(|(i, v)| match v {
                    JsonValue::Object(map) => Ok(map),
                    _ => Err(Error::config(format!("item {i} is not a JSON object"))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::new),
            JsonValue::Object(map) => Ok(Self::single(map)),
            _ => Err(Error::config("items must be a JSON array of objects")),
        }
    }

    /// Borrow the raw objects
    pub fn items(&self) -> &[JsonObject] {
        &self.items
    }
}

impl ParameterSource for ItemParameters {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn parameter(&self, name: &str, item: usize) -> Option<JsonValue> {
        let params = self.items.get(item)?;
        if let Some(value) = params.get(name) {
            return Some(value.clone());
        }
        let mut parts = name.split('.');
        let mut current = params.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current.clone())
    }
}

#[cfg(test)]
mod tests;
