//! Cekat CRM node (`cekatCrm`)
//!
//! Boards and their items. Every record is an envelope:
//! `{success, operation, <identifiers>, response}`.

use super::client::{CekatClient, UrlVariant};
use crate::columns::{process_create_item_columns, process_update_item_columns};
use crate::dispatch::{operation_table, selected_operation, ExecutionContext, Node, OperationKey};
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use crate::params::{ParameterSource, ParameterSourceExt};
use crate::types::{is_truthy, value_to_string, JsonObject, JsonValue, OutputRecord};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

operation_table! {
    /// Operations of the Cekat CRM node
    pub enum CrmOperation {
        GetAllBoards => ("lookup", "getAllBoards"),
        GetBoard => ("lookup", "getBoard"),
        GetAllItems => ("lookup", "getAllItems"),
        GetItem => ("lookup", "getItem"),
        SearchItems => ("lookup", "searchItems"),
        CreateItem => ("action", "createItem"),
        UpdateItem => ("action", "updateItem"),
        DeleteItems => ("action", "deleteItems"),
    }
}

/// Operators that take no comparison value
const VALUELESS_OPERATORS: [&str; 2] = ["is_empty", "is_not_empty"];

/// The Cekat CRM node
#[derive(Debug, Clone, Copy, Default)]
pub struct CekatCrmNode;

#[async_trait]
impl Node for CekatCrmNode {
    fn name(&self) -> &'static str {
        "cekatCrm"
    }

    fn operations(&self) -> Vec<OperationKey> {
        CrmOperation::ALL.iter().map(|op| op.key()).collect()
    }

    async fn execute_item(&self, ctx: &ExecutionContext<'_>, item: usize) -> Result<OutputRecord> {
        let (resource, operation) = selected_operation(ctx, item)?;
        let op = CrmOperation::parse(&resource, &operation)?;
        debug!(item, key = %op.key(), "Dispatching CRM operation");

        // Deletion guards answer without touching the API
        if op == CrmOperation::DeleteItems {
            if let Some(record) = delete_guard(ctx.params, item) {
                return Ok(OutputRecord::paired(record, item));
            }
        }

        let client = CekatClient::from_context(ctx).await?;
        let json = match op {
            CrmOperation::GetAllBoards => {
                let response = client
                    .call(UrlVariant::Server, ApiRequest::get("/api/crm/boards"))
                    .await?;
                json!({ "success": true, "operation": "getAllBoards", "response": response })
            }
            CrmOperation::GetBoard => {
                let board_id = ctx.params.required_str("boardId", item)?;
                let response = client
                    .call(UrlVariant::Server, ApiRequest::get(format!("/api/crm/boards/{board_id}")))
                    .await?;
                json!({ "success": true, "operation": "getBoard", "boardId": board_id, "response": response })
            }
            CrmOperation::GetAllItems => {
                let board_id = ctx.params.required_str("boardId", item)?;
                let request = ApiRequest::get(format!("/api/crm/boards/{board_id}/items"));
                let response = client.call(UrlVariant::Server, request).await?;
                json!({ "success": true, "operation": "getAllItems", "boardId": board_id, "response": response })
            }
            CrmOperation::GetItem => {
                let board_id = ctx.params.required_str("boardId", item)?;
                let item_id = ctx.params.required_str("itemId", item)?;
                let request = ApiRequest::get(format!("/api/crm/boards/{board_id}/items/{item_id}"));
                let response = client.call(UrlVariant::Server, request).await?;
                json!({
                    "success": true,
                    "operation": "getItem",
                    "boardId": board_id,
                    "itemId": item_id,
                    "response": response,
                })
            }
            CrmOperation::SearchItems => search_items(&client, ctx.params, item).await?,
            CrmOperation::CreateItem => create_item(&client, ctx.params, item).await?,
            CrmOperation::UpdateItem => update_item(&client, ctx.params, item).await?,
            CrmOperation::DeleteItems => delete_items(&client, ctx.params, item).await?,
        };

        Ok(OutputRecord::paired(json, item))
    }
}

/// Validate search conditions from the manual collection or dynamic JSON
pub fn search_conditions(params: &dyn ParameterSource, item: usize) -> Result<Vec<JsonValue>> {
    let conditions = if params.str_or("searchInputMethod", item, "manual") == "dynamic" {
        match params.json_value("dynamicSearchData", item) {
            Ok(Some(JsonValue::Array(values))) => values,
            Ok(_) => {
                return Err(Error::invalid_param(
                    "dynamicSearchData",
                    "Dynamic search data must be an array",
                ))
            }
            Err(e) => {
                return Err(Error::invalid_param(
                    "dynamicSearchData",
                    format!("Error parsing dynamic search data: {e}"),
                ))
            }
        }
    } else {
        params
            .array_or_empty("searchConditions.condition", item)
            .iter()
            .map(|c| {
                json!({
                    "column_name": c.get("column_name").cloned().unwrap_or(JsonValue::Null),
                    "operator": c.get("operator").cloned().unwrap_or(JsonValue::Null),
                    "value": c.get("value").filter(|v| is_truthy(v)).cloned().unwrap_or(json!("")),
                })
            })
            .collect()
    };

    if conditions.is_empty() {
        return Err(Error::invalid_param(
            "searchConditions",
            "At least one search condition is required",
        ));
    }

    for condition in &conditions {
        let column = condition.get("column_name").map(value_to_string).unwrap_or_default();
        let operator = condition.get("operator").map(value_to_string).unwrap_or_default();
        if column.is_empty() || operator.is_empty() {
            return Err(Error::invalid_param(
                "searchConditions",
                "Each search condition must have column_name and operator",
            ));
        }
        let missing_value = match condition.get("value") {
            None => true,
            Some(JsonValue::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if !VALUELESS_OPERATORS.contains(&operator.as_str()) && missing_value {
            return Err(Error::invalid_param(
                "searchConditions",
                format!("Operator \"{operator}\" requires a value"),
            ));
        }
    }

    Ok(conditions)
}

async fn search_items(client: &CekatClient, params: &dyn ParameterSource, item: usize) -> Result<JsonValue> {
    let board_id = params.required_str("boardId", item)?;
    let condition = params.str_or("condition", item, "AND");
    let conditions = search_conditions(params, item)?;
    let count = conditions.len();

    let body = json!({ "condition": condition, "search": conditions });
    debug!(board_id = %board_id, conditions = count, "Searching board items");

    let request = ApiRequest::post(format!("/api/crm/boards/{board_id}/items/search")).json(body);
    let response = client.call(UrlVariant::Server, request).await?;
    Ok(json!({
        "success": true,
        "operation": "searchItems",
        "boardId": board_id,
        "searchConditions": count,
        "condition": condition,
        "response": response,
    }))
}

/// Body for a new item: formatted columns, then `item_name` and `group_id`
pub fn create_item_body(params: &dyn ParameterSource, item: usize) -> JsonObject {
    let mut body = process_create_item_columns(&params.array_or_empty("columns.column", item));
    if let Some(name) = params.opt_str("itemName", item) {
        body.insert("item_name".into(), json!(name));
    }
    if let Some(group) = params.opt_str("groupId", item) {
        body.insert("group_id".into(), json!(group));
    }
    body
}

async fn create_item(client: &CekatClient, params: &dyn ParameterSource, item: usize) -> Result<JsonValue> {
    let board_id = params.required_str("boardId", item)?;
    let body = create_item_body(params, item);

    let request = ApiRequest::post(format!("/api/crm/boards/{board_id}/items"))
        .json(JsonValue::Object(body.clone()));
    let response = client.call(UrlVariant::Server, request).await?;
    Ok(json!({
        "success": true,
        "operation": "createItem",
        "boardId": board_id,
        "requestBody": body,
        "response": response,
    }))
}

/// Body for an item update: formatted columns plus an optional raw single column
pub fn update_item_body(params: &dyn ParameterSource, item: usize) -> JsonObject {
    let mut body = process_update_item_columns(&params.array_or_empty("columns.column", item));
    if let Some(column) = params.opt_str("columnToUpdate", item) {
        if let Some(value) = params.parameter("newValue", item) {
            body.insert(column, value);
        }
    }
    body
}

async fn update_item(client: &CekatClient, params: &dyn ParameterSource, item: usize) -> Result<JsonValue> {
    let board_id = params.required_str("boardId", item)?;
    let item_id = params.required_str("itemId", item)?;
    let body = update_item_body(params, item);

    let request = ApiRequest::put(format!("/api/crm/boards/{board_id}/items/{item_id}"))
        .json(JsonValue::Object(body.clone()));
    let response = client.call(UrlVariant::Server, request).await?;
    Ok(json!({
        "success": true,
        "operation": "updateItem",
        "boardId": board_id,
        "itemId": item_id,
        "updatedFields": body,
        "response": response,
    }))
}

fn item_ids(params: &dyn ParameterSource, item: usize) -> Vec<JsonValue> {
    match params.parameter("itemIds", item) {
        Some(JsonValue::Array(ids)) => ids,
        Some(JsonValue::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| json!(s))
            .collect(),
        Some(JsonValue::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

/// `success:false` record when deletion is unconfirmed or has nothing to delete
pub fn delete_guard(params: &dyn ParameterSource, item: usize) -> Option<JsonValue> {
    if !params.bool_or("confirmDelete", item, false) {
        return Some(json!({
            "success": false,
            "message": "Deletion not confirmed. Please check the confirmation checkbox.",
            "operation": "deleteItems",
        }));
    }
    if item_ids(params, item).is_empty() {
        return Some(json!({
            "success": false,
            "message": "No valid item IDs provided",
            "operation": "deleteItems",
        }));
    }
    None
}

async fn delete_items(client: &CekatClient, params: &dyn ParameterSource, item: usize) -> Result<JsonValue> {
    let board_id = params.required_str("boardId", item)?;
    let ids = item_ids(params, item);

    let request = ApiRequest::delete(format!("/api/crm/boards/{board_id}/items"))
        .json(json!({ "item_ids": ids }));
    match client.call(UrlVariant::Server, request).await {
        Ok(response) => Ok(json!({
            "success": true,
            "operation": "deleteItems",
            "boardId": board_id,
            "totalItems": ids.len(),
            "itemIds": ids,
            "response": response,
        })),
        Err(e) => {
            warn!(board_id = %board_id, error = %e, "Batch delete failed");
            Ok(json!({
                "success": false,
                "operation": "deleteItems",
                "boardId": board_id,
                "itemIds": ids,
                "error": e.to_string(),
            }))
        }
    }
}
