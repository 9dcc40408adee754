//! Dropdown loaders for the Power BI node
//!
//! Workspace-scoped lists answer with a single placeholder entry until the
//! workspace they depend on has been chosen.

use super::client::{group_path, PowerBiClient};
use crate::dispatch::ExecutionContext;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::options::{first_text, OptionItem, OptionLoader};
use crate::params::ParameterSourceExt;
use crate::types::JsonValue;
use async_trait::async_trait;
use tracing::warn;

/// Option methods of the `powerBi` node
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerBiOptions;

impl PowerBiOptions {
    pub const METHODS: &'static [&'static str] = &[
        "getGroups",
        "getGroupsMultiSelect",
        "getDashboards",
        "getDatasets",
        "getDataflows",
        "getDatasources",
        "getGateways",
        "getTables",
        "getReports",
    ];
}

#[async_trait]
impl OptionLoader for PowerBiOptions {
    fn node(&self) -> &'static str {
        "powerBi"
    }

    fn methods(&self) -> &'static [&'static str] {
        Self::METHODS
    }

    async fn load(&self, method: &str, ctx: &ExecutionContext<'_>) -> Result<Vec<OptionItem>> {
        if !Self::METHODS.contains(&method) {
            return Err(self.unknown_method(method));
        }
        let client = PowerBiClient::from_context(ctx).await?;
        let group = ctx.params.str_or("groupId", 0, "");

        match method {
            "getGroups" => {
                let groups = client.request_all("/groups", "value").await?;
                let mut options = vec![OptionItem::new("My Workspace", "me")];
                options.extend(pairs(&groups, "name", "id"));
                Ok(options)
            }
            "getGroupsMultiSelect" => {
                let groups = client.request_all("/groups", "value").await?;
                Ok(pairs(&groups, "name", "id"))
            }
            "getDatasets" | "getReports" | "getDashboards" => {
                if group.is_empty() {
                    return Ok(vec![OptionItem::placeholder("Select a group first")]);
                }
                let (suffix, name_field) = match method {
                    "getDatasets" => ("/datasets", "name"),
                    "getReports" => ("/reports", "name"),
                    _ => ("/dashboards", "displayName"),
                };
                let entries = client.request_all(&group_path(&group, suffix), "value").await?;
                Ok(pairs(&entries, name_field, "id"))
            }
            "getTables" => {
                let dataset = ctx.params.str_or("datasetId", 0, "");
                if group.is_empty() || dataset.is_empty() {
                    return Ok(vec![OptionItem::placeholder("Select a group and dataset first")]);
                }
                let path = group_path(&group, &format!("/datasets/{dataset}/tables"));
                let tables = client.request_all(&path, "value").await?;
                Ok(pairs(&tables, "name", "name"))
            }
            "getGateways" => match client.request(ApiRequest::get("/gateways")).await {
                Ok(response) => Ok(pairs(values(&response).unwrap_or_default(), "name", "id")),
                Err(e) => {
                    // Listing gateways needs gateway admin rights
                    warn!(error = %e, "Could not list gateways");
                    Ok(Vec::new())
                }
            },
            "getDatasources" => load_datasources(&client, ctx).await,
            _ => load_dataflows(&client, &group).await,
        }
    }
}

async fn load_datasources(client: &PowerBiClient, ctx: &ExecutionContext<'_>) -> Result<Vec<OptionItem>> {
    let Some(gateway) = ctx.params.opt_str("gatewayId", 0) else {
        return Ok(vec![OptionItem::placeholder("-- Select a gateway first --")]);
    };
    let request = ApiRequest::get(format!("/gateways/{gateway}/datasources"));
    match client.request(request).await {
        Ok(response) => Ok(values(&response)
            .unwrap_or_default()
            .iter()
            .filter_map(|source| {
                let name = first_text(source, &["datasourceName"])?;
                let id = source.get("id")?.clone();
                let kind = first_text(source, &["datasourceType"]).unwrap_or_default();
                Some(OptionItem::new(format!("{name} ({kind})"), id))
            })
            .collect()),
        Err(e) => {
            warn!(error = %e, gateway = %gateway, "Could not list gateway data sources");
            Ok(vec![OptionItem::placeholder(
                "Error loading data sources. Check permissions.",
            )])
        }
    }
}

async fn load_dataflows(client: &PowerBiClient, group: &str) -> Result<Vec<OptionItem>> {
    if group.is_empty() {
        return Ok(vec![OptionItem::placeholder("Select a workspace first")]);
    }
    let response = match client
        .request(ApiRequest::get(format!("/groups/{group}/dataflows")))
        .await
    {
        Ok(response) => response,
        Err(e) => {
            return Ok(vec![OptionItem::placeholder(format!(
                "Error loading dataflows: {e}"
            ))])
        }
    };

    let Some(dataflows) = values(&response) else {
        return Ok(vec![OptionItem::placeholder(
            "API response does not contain dataflows",
        )]);
    };
    if dataflows.is_empty() {
        return Ok(vec![OptionItem::placeholder(
            "No dataflow found in this workspace",
        )]);
    }
    // Dataflows are keyed by objectId rather than id
    let options = pairs(dataflows, "name", "objectId");
    if options.is_empty() {
        return Ok(vec![OptionItem::placeholder("No valid dataflow found")]);
    }
    Ok(options)
}

fn values(response: &JsonValue) -> Option<&[JsonValue]> {
    response
        .get("value")
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
}

/// Entries with both a non-empty name and value
fn pairs(entries: &[JsonValue], name_field: &str, value_field: &str) -> Vec<OptionItem> {
    entries
        .iter()
        .filter_map(|entry| {
            let name = first_text(entry, &[name_field])?;
            let value = entry.get(value_field).filter(|v| match v {
                JsonValue::Null => false,
                JsonValue::String(s) => !s.is_empty(),
                _ => true,
            })?;
            Some(OptionItem::new(name, value.clone()))
        })
        .collect()
}
