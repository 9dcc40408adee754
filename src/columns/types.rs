//! Column value types

use crate::types::{number_to_json, JsonValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Declared type of a CRM board column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Text,
    Number,
    Date,
    Checkbox,
    Email,
    Phone,
    Longtext,
    Select,
    Dropdown,
    Timeline,
    Files,
    Agents,
    Contacts,
    Companies,
    Orders,
    Subscriptions,
    References,
    Conversation,
}

impl ValueType {
    /// Every declared type, in UI order
    pub const ALL: [ValueType; 18] = [
        ValueType::Text,
        ValueType::Number,
        ValueType::Date,
        ValueType::Checkbox,
        ValueType::Email,
        ValueType::Phone,
        ValueType::Longtext,
        ValueType::Select,
        ValueType::Dropdown,
        ValueType::Timeline,
        ValueType::Files,
        ValueType::Agents,
        ValueType::Contacts,
        ValueType::Companies,
        ValueType::Orders,
        ValueType::Subscriptions,
        ValueType::References,
        ValueType::Conversation,
    ];

    /// Parse a type tag; `string` and unknown tags are plain text
    pub fn parse(tag: &str) -> Self {
        match tag {
            "number" => ValueType::Number,
            "date" => ValueType::Date,
            "checkbox" => ValueType::Checkbox,
            "email" => ValueType::Email,
            "phone" => ValueType::Phone,
            "longtext" => ValueType::Longtext,
            "select" => ValueType::Select,
            "dropdown" => ValueType::Dropdown,
            "timeline" => ValueType::Timeline,
            "files" => ValueType::Files,
            "agents" => ValueType::Agents,
            "contacts" => ValueType::Contacts,
            "companies" => ValueType::Companies,
            "orders" => ValueType::Orders,
            "subscriptions" => ValueType::Subscriptions,
            "references" => ValueType::References,
            "conversation" => ValueType::Conversation,
            _ => ValueType::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Number => "number",
            ValueType::Date => "date",
            ValueType::Checkbox => "checkbox",
            ValueType::Email => "email",
            ValueType::Phone => "phone",
            ValueType::Longtext => "longtext",
            ValueType::Select => "select",
            ValueType::Dropdown => "dropdown",
            ValueType::Timeline => "timeline",
            ValueType::Files => "files",
            ValueType::Agents => "agents",
            ValueType::Contacts => "contacts",
            ValueType::Companies => "companies",
            ValueType::Orders => "orders",
            ValueType::Subscriptions => "subscriptions",
            ValueType::References => "references",
            ValueType::Conversation => "conversation",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attached file of a `files` column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
}

/// A formatted column value, shaped the way the CRM API expects it
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// text, email, phone, longtext, select, conversation and dates
    Text(String),
    Number(f64),
    Checkbox(bool),
    /// dropdown and references: split, trimmed strings
    List(Vec<String>),
    /// agents, contacts, companies, orders, subscriptions: the submitted
    /// value as is, or an empty array when nothing was submitted
    Ids(JsonValue),
    Timeline { from: String, to: String },
    Files(Vec<FileEntry>),
}

impl ColumnValue {
    /// Render as JSON; whole numbers are emitted as integers
    pub fn to_json(&self) -> JsonValue {
        match self {
            ColumnValue::Text(s) => json!(s),
            ColumnValue::Number(n) => number_to_json(*n),
            ColumnValue::Checkbox(b) => json!(b),
            ColumnValue::List(items) => json!(items),
            ColumnValue::Ids(ids) => ids.clone(),
            ColumnValue::Timeline { from, to } => json!({ "from": from, "to": to }),
            ColumnValue::Files(files) => json!(files),
        }
    }
}
