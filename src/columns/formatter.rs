//! Column Value Formatter
//!
//! Turns a column name, a declared type tag and the raw fields a user
//! submitted into the single `{ column_name: value }` object the CRM API
//! expects. Every type resolves to a value; nothing here fails.

use super::types::{ColumnValue, FileEntry, ValueType};
use crate::types::{is_truthy, value_to_string, JsonObject, JsonValue};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

/// Format one column into a singleton map keyed by its name
pub fn format_column(column_name: &str, value_type: &str, params: &JsonObject) -> JsonObject {
    let value_type = ValueType::parse(value_type);
    let value = format_value(value_type, params);
    debug!(column = column_name, %value_type, value = ?value, "Formatted column value");

    let mut out = JsonObject::new();
    out.insert(column_name.to_string(), value.to_json());
    out
}

/// Compute the typed value for a column
pub fn format_value(value_type: ValueType, params: &JsonObject) -> ColumnValue {
    match value_type {
        ValueType::Text => {
            let text = truthy_string(params, "textValue")
                .or_else(|| truthy_string(params, "stringValue"))
                .unwrap_or_default();
            ColumnValue::Text(text)
        }
        ValueType::Number => ColumnValue::Number(to_number(params.get("numberValue"))),
        ValueType::Date => ColumnValue::Text(
            params
                .get("dateValue")
                .filter(|v| is_truthy(v))
                .and_then(format_date)
                .unwrap_or_default(),
        ),
        ValueType::Checkbox => {
            ColumnValue::Checkbox(params.get("checkboxValue").is_some_and(is_truthy))
        }
        ValueType::Email => ColumnValue::Text(string_field(params, "emailValue")),
        ValueType::Phone => ColumnValue::Text(string_field(params, "phoneValue")),
        ValueType::Longtext => ColumnValue::Text(string_field(params, "longTextValue")),
        ValueType::Select => ColumnValue::Text(string_field(params, "selectValue")),
        ValueType::Conversation => ColumnValue::Text(string_field(params, "conversationValue")),
        ValueType::Dropdown => ColumnValue::List(split_list(params.get("dropdownValues"))),
        ValueType::References => ColumnValue::List(split_list(params.get("referenceIds"))),
        ValueType::Agents => ColumnValue::Ids(id_list(params.get("agentIds"))),
        ValueType::Contacts => ColumnValue::Ids(id_list(params.get("contactIds"))),
        ValueType::Companies => ColumnValue::Ids(id_list(params.get("companyIds"))),
        ValueType::Orders => ColumnValue::Ids(id_list(params.get("orderIds"))),
        ValueType::Subscriptions => ColumnValue::Ids(id_list(params.get("subscriptionIds"))),
        ValueType::Timeline => ColumnValue::Timeline {
            from: string_field(params, "timelineFrom"),
            to: string_field(params, "timelineTo"),
        },
        ValueType::Files => ColumnValue::Files(file_entries(params)),
    }
}

/// Fold `[{columnName, valueType, ...fields}]` entries into one object
///
/// Entries without a name or type are skipped; later names overwrite
/// earlier ones.
pub fn process_create_item_columns(columns: &[JsonValue]) -> JsonObject {
    let mut processed = JsonObject::new();
    for (index, column) in columns.iter().enumerate() {
        match column.as_object() {
            Some(entry) => merge_entry(&mut processed, entry, index),
            None => debug!(index, "Skipping column entry that is not an object"),
        }
    }
    processed
}

/// Fold `[{column: {columnName, valueType, ...fields}}]` entries into one object
pub fn process_update_item_columns(columns: &[JsonValue]) -> JsonObject {
    let mut processed = JsonObject::new();
    for (index, column) in columns.iter().enumerate() {
        let entry = column
            .get("column")
            .and_then(JsonValue::as_object)
            .or_else(|| column.as_object());
        match entry {
            Some(entry) => merge_entry(&mut processed, entry, index),
            None => debug!(index, "Skipping column entry that is not an object"),
        }
    }
    processed
}

fn merge_entry(processed: &mut JsonObject, entry: &JsonObject, index: usize) {
    let name = entry.get("columnName").and_then(JsonValue::as_str);
    let value_type = entry.get("valueType").and_then(JsonValue::as_str);
    match (name, value_type) {
        (Some(name), Some(value_type)) if !name.is_empty() && !value_type.is_empty() => {
            processed.extend(format_column(name, value_type, entry));
        }
        _ => debug!(index, "Skipping column entry without columnName or valueType"),
    }
}

// ============================================================================
// Coercions
// ============================================================================

fn truthy_string(params: &JsonObject, key: &str) -> Option<String> {
    params
        .get(key)
        .filter(|v| is_truthy(v))
        .map(value_to_string)
}

fn string_field(params: &JsonObject, key: &str) -> String {
    truthy_string(params, key).unwrap_or_default()
}

/// Numeric coercion: blank is 0, anything unparseable or non-finite is 0
fn to_number(value: Option<&JsonValue>) -> f64 {
    let n = match value {
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(JsonValue::Bool(b)) => f64::from(u8::from(*b)),
        Some(JsonValue::String(s)) => parse_numeric_string(s),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn parse_numeric_string(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix).map_or(0.0, |v| v as f64);
    }
    // Rust accepts "inf" and "nan" spellings that are not numbers here
    if s.chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')))
    {
        return 0.0;
    }
    s.parse::<f64>().unwrap_or(0.0)
}

/// Render a date as its UTC digits followed by the host's numeric offset
/// at that instant, e.g. `2024-03-05T10:30:00.000+07:00` for 10:30Z
fn format_date(value: &JsonValue) -> Option<String> {
    let instant = match value {
        JsonValue::String(s) => parse_date(s.trim())?,
        JsonValue::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single()?,
        _ => return None,
    };
    let offset = instant.with_timezone(&Local).format("%:z");
    Some(format!("{}{offset}", instant.format("%Y-%m-%dT%H:%M:%S%.3f")))
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Comma-separated list, each entry trimmed; arrays are taken item by item
fn split_list(value: Option<&JsonValue>) -> Vec<String> {
    match value {
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|v| value_to_string(v).trim().to_string())
            .collect(),
        Some(v) if is_truthy(v) => value_to_string(v)
            .split(',')
            .map(|part| part.trim().to_string())
            .collect(),
        _ => Vec::new(),
    }
}

fn id_list(value: Option<&JsonValue>) -> JsonValue {
    match value {
        Some(v) if is_truthy(v) => v.clone(),
        _ => JsonValue::Array(Vec::new()),
    }
}

fn file_entries(params: &JsonObject) -> Vec<FileEntry> {
    let files = params
        .get("files")
        .and_then(|f| f.get("file"))
        .and_then(JsonValue::as_array);
    let Some(files) = files else {
        return Vec::new();
    };
    files
        .iter()
        .map(|file| {
            let field = |key: &str| {
                file.get(key)
                    .filter(|v| is_truthy(v))
                    .map(value_to_string)
                    .unwrap_or_default()
            };
            FileEntry {
                file_name: field("fileName"),
                file_url: field("fileUrl"),
                file_type: field("fileType"),
            }
        })
        .collect()
}
