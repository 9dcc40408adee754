//! Column Value Formatter for CRM board items
//!
//! CRM boards have user-defined typed columns. A create or update request
//! sends one entry per column, shaped by the column's type:
//!
//! | type | value |
//! |------|-------|
//! | text, email, phone, longtext, select, conversation | string |
//! | number | number (0 when not parseable) |
//! | date | local ISO-8601 with numeric offset |
//! | checkbox | boolean |
//! | dropdown, references | trimmed strings split on `,` |
//! | agents, contacts, companies, orders, subscriptions | id array |
//! | timeline | `{from, to}` |
//! | files | `[{file_name, file_url, file_type}]` |

mod formatter;
mod types;

pub use formatter::{
    format_column, format_value, process_create_item_columns, process_update_item_columns,
};
pub use types::{ColumnValue, FileEntry, ValueType};
