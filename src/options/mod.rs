//! Dropdown option loaders
//!
//! A loader fetches a reference list (inboxes, boards, workspaces, ...) and
//! turns it into `{name, value}` pairs for a UI dropdown. Loaders are never
//! called while a workflow executes; they read their prerequisite
//! parameters from the first item of the context.

use crate::dispatch::ExecutionContext;
use crate::error::{Error, Result};
use crate::types::{JsonValue, value_to_string};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One dropdown entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionItem {
    pub name: String,
    pub value: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OptionItem {
    pub fn new(name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: None,
        }
    }

    /// Attach a description shown under the entry
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Entry with an empty value, shown when a prerequisite is missing
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }
}

/// A family of named option-loading methods
#[async_trait]
pub trait OptionLoader: Send + Sync {
    /// Node type the methods belong to
    fn node(&self) -> &'static str;

    /// Method names this loader answers
    fn methods(&self) -> &'static [&'static str];

    /// Run one method
    async fn load(&self, method: &str, ctx: &ExecutionContext<'_>) -> Result<Vec<OptionItem>>;

    /// Error for a method this loader does not know
    fn unknown_method(&self, method: &str) -> Error {
        Error::UnknownOptionsMethod {
            node: self.node().to_string(),
            method: method.to_string(),
        }
    }
}

/// Pull the list of entries out of a response
///
/// Accepts a bare array, `{data: [...]}`, `{value: [...]}` or
/// `{data: {<key>: [...]}}` for the given nested key.
pub fn extract_list<'a>(response: &'a JsonValue, nested_key: Option<&str>) -> &'a [JsonValue] {
    if let Some(items) = response.as_array() {
        return items;
    }
    let data = response.get("data");
    if let Some(items) = data.and_then(JsonValue::as_array) {
        return items;
    }
    if let Some(items) = nested_key
        .and_then(|key| data.and_then(|d| d.get(key)))
        .and_then(JsonValue::as_array)
    {
        return items;
    }
    response
        .get("value")
        .and_then(JsonValue::as_array)
        .map_or(&[], Vec::as_slice)
}

/// First non-empty string among `fields` of an entry
pub fn first_text(entry: &JsonValue, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| entry.get(*field))
        .map(value_to_string)
        .find(|s| !s.is_empty())
}

/// Map entries to options using the first populated name field and `id`
pub fn named_options(entries: &[JsonValue], name_fields: &[&str], value_field: &str) -> Vec<OptionItem> {
    entries
        .iter()
        .filter_map(|entry| {
            let value = entry.get(value_field)?.clone();
            let name = first_text(entry, name_fields).unwrap_or_else(|| value_to_string(&value));
            Some(OptionItem::new(name, value))
        })
        .collect()
}
