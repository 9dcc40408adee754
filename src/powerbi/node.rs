//! Power BI node (`powerBi`)
//!
//! Workspace-scoped resources take an optional `groupId`; see
//! [`group_path`] for how it selects the endpoint. Every operation yields
//! one record per input item holding the upstream response, except the
//! write operations that answer with a short confirmation.

use super::client::{group_path, PowerBiClient};
use super::export::{export_to_file, Sleeper, TokioSleeper};
use crate::dispatch::{operation_table, selected_operation, ExecutionContext, Node, OperationKey};
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use crate::params::{ParameterSource, ParameterSourceExt};
use crate::types::{value_to_string, JsonValue, OutputRecord};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

operation_table! {
    /// Operations of the Power BI node
    pub enum PowerBiOperation {
        AdminGetInfo => ("admin", "getInfo"),
        AdminGetScanResult => ("admin", "getScanResult"),
        DashboardList => ("dashboard", "list"),
        DashboardGet => ("dashboard", "get"),
        DashboardGetTiles => ("dashboard", "getTiles"),
        DataflowList => ("dataflow", "list"),
        DataflowGet => ("dataflow", "get"),
        DataflowGetDatasources => ("dataflow", "getDatasources"),
        DataflowRefresh => ("dataflow", "refresh"),
        DatasetList => ("dataset", "list"),
        DatasetGet => ("dataset", "get"),
        DatasetGetTables => ("dataset", "getTables"),
        DatasetGetRefreshHistory => ("dataset", "getRefreshHistory"),
        DatasetRefresh => ("dataset", "refresh"),
        DatasetAddRows => ("dataset", "addRows"),
        DatasetExecuteQueries => ("dataset", "executeQueries"),
        GatewayList => ("gateway", "list"),
        GatewayGet => ("gateway", "get"),
        GatewayGetDatasources => ("gateway", "getDatasources"),
        GatewayGetDatasource => ("gateway", "getDatasource"),
        GatewayGetDatasourceStatus => ("gateway", "getDatasourceStatus"),
        GatewayGetDatasourceUsers => ("gateway", "getDatasourceUsers"),
        GroupList => ("group", "list"),
        GroupGet => ("group", "get"),
        GroupGetDashboards => ("group", "getDashboards"),
        GroupGetDatasets => ("group", "getDatasets"),
        GroupGetReports => ("group", "getReports"),
        ReportList => ("report", "list"),
        ReportGet => ("report", "get"),
        ReportGetPages => ("report", "getPages"),
        ReportExportToFile => ("report", "exportToFile"),
    }
}

/// The Power BI node
#[derive(Clone)]
pub struct PowerBiNode {
    sleeper: Arc<dyn Sleeper>,
}

impl PowerBiNode {
    pub fn new() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper used between export status polls
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }
}

impl Default for PowerBiNode {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PowerBiNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerBiNode").finish_non_exhaustive()
    }
}

#[async_trait]
impl Node for PowerBiNode {
    fn name(&self) -> &'static str {
        "powerBi"
    }

    fn operations(&self) -> Vec<OperationKey> {
        PowerBiOperation::ALL.iter().map(|op| op.key()).collect()
    }

    async fn execute_item(&self, ctx: &ExecutionContext<'_>, item: usize) -> Result<OutputRecord> {
        let (resource, operation) = selected_operation(ctx, item)?;
        let op = PowerBiOperation::parse(&resource, &operation)?;
        debug!(item, key = %op.key(), "Dispatching Power BI operation");

        let client = PowerBiClient::from_context(ctx).await?;
        let params = ctx.params;
        let group = params.str_or("groupId", item, "");

        let json = match op {
            // Admin
            PowerBiOperation::AdminGetInfo => admin_get_info(&client, params, item).await?,
            PowerBiOperation::AdminGetScanResult => {
                let scan_id = params.required_str("scanId", item)?;
                get(&client, format!("/admin/workspaces/scanResult/{scan_id}")).await?
            }

            // Dashboards
            PowerBiOperation::DashboardList => get(&client, group_path(&group, "/dashboards")).await?,
            PowerBiOperation::DashboardGet => {
                let id = params.required_str("dashboardId", item)?;
                get(&client, group_path(&group, &format!("/dashboards/{id}"))).await?
            }
            PowerBiOperation::DashboardGetTiles => {
                let id = params.required_str("dashboardId", item)?;
                get(&client, group_path(&group, &format!("/dashboards/{id}/tiles"))).await?
            }

            // Dataflows are always addressed inside a workspace
            PowerBiOperation::DataflowList => {
                let group = params.required_str("groupId", item)?;
                get(&client, format!("/groups/{group}/dataflows")).await?
            }
            PowerBiOperation::DataflowGet => {
                let path = dataflow_path(params, item, "")?;
                get(&client, path)
                    .await
                    .map_err(|e| dataflow_error(e, "access this dataflow", "the ID is correct"))?
            }
            PowerBiOperation::DataflowGetDatasources => {
                let path = dataflow_path(params, item, "/datasources")?;
                get(&client, path).await.map_err(|e| {
                    dataflow_error(e, "access this dataflow", "the workspace and dataflow IDs are correct")
                })?
            }
            PowerBiOperation::DataflowRefresh => {
                let path = dataflow_path(params, item, "/refreshes")?;
                let mut request = ApiRequest::post(path).json(json!({
                    "notifyOption": params.str_or("notifyOption", item, "NoNotification"),
                }));
                if let Some(process_type) = params.opt_str("processType", item) {
                    request = request.query("processType", process_type);
                }
                client
                    .request(request)
                    .await
                    .map_err(|e| dataflow_error(e, "refresh this dataflow", "the ID is correct"))?;
                json!({ "success": true, "message": "Dataflow refresh triggered successfully" })
            }

            // Datasets
            PowerBiOperation::DatasetList => get(&client, group_path(&group, "/datasets")).await?,
            PowerBiOperation::DatasetGet => {
                let id = params.required_str("datasetId", item)?;
                get(&client, group_path(&group, &format!("/datasets/{id}"))).await?
            }
            PowerBiOperation::DatasetGetTables => {
                let id = params.required_str("datasetId", item)?;
                get(&client, group_path(&group, &format!("/datasets/{id}/tables"))).await?
            }
            PowerBiOperation::DatasetGetRefreshHistory => {
                let id = params.required_str("datasetId", item)?;
                let mut request = ApiRequest::get(group_path(&group, &format!("/datasets/{id}/refreshes")));
                if let Some(top) = params.parameter("top", item).filter(|v| !v.is_null()) {
                    request = request.query("$top", value_to_string(&top));
                }
                client.request(request).await?
            }
            PowerBiOperation::DatasetRefresh => {
                let id = params.required_str("datasetId", item)?;
                let path = group_path(&group, &format!("/datasets/{id}/refreshes"));
                client.request(ApiRequest::post(path)).await?;
                json!({ "success": true, "message": "Refresh started successfully" })
            }
            PowerBiOperation::DatasetAddRows => {
                let id = params.required_str("datasetId", item)?;
                let table = params.required_str("tableName", item)?;
                let rows = rows_value(params, item)?;
                let path = group_path(&group, &format!("/datasets/{id}/tables/{table}/rows"));
                client
                    .request(ApiRequest::post(path).json(json!({ "rows": rows })))
                    .await?;
                json!({ "success": true, "message": "Rows added successfully" })
            }
            PowerBiOperation::DatasetExecuteQueries => {
                let id = params.required_str("datasetId", item)?;
                let path = group_path(&group, &format!("/datasets/{id}/executeQueries"));
                let body = execute_queries_body(params, item)?;
                client.request(ApiRequest::post(path).json(body)).await?
            }

            // Gateways
            PowerBiOperation::GatewayList => get(&client, "/gateways".to_string()).await?,
            PowerBiOperation::GatewayGet => {
                let id = params.required_str("gatewayId", item)?;
                get(&client, format!("/gateways/{id}")).await?
            }
            PowerBiOperation::GatewayGetDatasources => {
                let id = params.required_str("gatewayId", item)?;
                get(&client, format!("/gateways/{id}/datasources")).await?
            }
            PowerBiOperation::GatewayGetDatasource => {
                get(&client, gateway_datasource_path(params, item, "")?).await?
            }
            PowerBiOperation::GatewayGetDatasourceStatus => {
                get(&client, gateway_datasource_path(params, item, "/status")?).await?
            }
            PowerBiOperation::GatewayGetDatasourceUsers => {
                get(&client, gateway_datasource_path(params, item, "/users")?).await?
            }

            // Groups
            PowerBiOperation::GroupList => get(&client, "/groups".to_string()).await?,
            PowerBiOperation::GroupGet => {
                let id = params.required_str("groupId", item)?;
                get(&client, format!("/groups/{id}")).await?
            }
            PowerBiOperation::GroupGetDashboards => {
                let id = params.required_str("groupId", item)?;
                get(&client, format!("/groups/{id}/dashboards")).await?
            }
            PowerBiOperation::GroupGetDatasets => {
                let id = params.required_str("groupId", item)?;
                get(&client, format!("/groups/{id}/datasets")).await?
            }
            PowerBiOperation::GroupGetReports => {
                let id = params.required_str("groupId", item)?;
                get(&client, format!("/groups/{id}/reports")).await?
            }

            // Reports
            PowerBiOperation::ReportList => get(&client, group_path(&group, "/reports")).await?,
            PowerBiOperation::ReportGet => {
                let id = params.required_str("reportId", item)?;
                get(&client, group_path(&group, &format!("/reports/{id}"))).await?
            }
            PowerBiOperation::ReportGetPages => {
                let id = params.required_str("reportId", item)?;
                get(&client, group_path(&group, &format!("/reports/{id}/pages"))).await?
            }
            PowerBiOperation::ReportExportToFile => {
                return export_to_file(
                    &client,
                    self.sleeper.as_ref(),
                    params,
                    &ctx.config.export,
                    item,
                )
                .await;
            }
        };

        Ok(OutputRecord::paired(json, item))
    }
}

async fn get(client: &PowerBiClient, path: String) -> Result<JsonValue> {
    client.request(ApiRequest::get(path)).await
}

async fn admin_get_info(client: &PowerBiClient, params: &dyn ParameterSource, item: usize) -> Result<JsonValue> {
    let workspaces = match params.parameter("workspaces", item) {
        Some(JsonValue::Array(ids)) => ids,
        Some(JsonValue::String(id)) if !id.is_empty() => vec![json!(id)],
        _ => Vec::new(),
    };
    if workspaces.is_empty() {
        return Err(Error::invalid_param(
            "workspaces",
            "You must select at least one workspace",
        ));
    }

    let flag = |name: &str, default: bool| {
        if params.bool_or(name, item, default) {
            "True"
        } else {
            "False"
        }
    };
    let request = ApiRequest::post("/admin/workspaces/getInfo")
        .query("datasetSchema", flag("datasetSchema", true))
        .query("datasetExpressions", flag("datasetExpressions", true))
        .query("lineage", flag("lineage", false))
        .query("datasourceDetails", flag("datasourceDetails", false))
        .json(json!({ "workspaces": workspaces }));
    client.request(request).await
}

fn rows_value(params: &dyn ParameterSource, item: usize) -> Result<JsonValue> {
    match params.parameter("data", item) {
        Some(JsonValue::String(text)) if !text.trim().is_empty() => serde_json::from_str(&text)
            .map_err(|e| Error::invalid_param("data", format!("Could not parse rows JSON: {e}"))),
        Some(value @ (JsonValue::Array(_) | JsonValue::Object(_))) => Ok(value),
        _ => Err(Error::missing_param("data", item)),
    }
}

fn dataflow_path(params: &dyn ParameterSource, item: usize, suffix: &str) -> Result<String> {
    let group = params.required_str("groupId", item)?;
    let dataflow = params.required_str("dataflowId", item)?;
    Ok(format!("/groups/{group}/dataflows/{dataflow}{suffix}"))
}

/// Replace bare 403/404 statuses with an explanation
pub fn dataflow_error(error: Error, action: &str, check: &str) -> Error {
    match error.status() {
        Some(403) => Error::Other(format!(
            "Access denied. Please verify that you have permissions to {action}."
        )),
        Some(404) => Error::Other(format!("Dataflow not found. Please verify that {check}.")),
        _ => error,
    }
}

fn gateway_datasource_path(params: &dyn ParameterSource, item: usize, suffix: &str) -> Result<String> {
    let gateway = params.required_str("gatewayId", item)?;
    let datasource = params.required_str("datasourceId", item)?;
    Ok(format!("/gateways/{gateway}/datasources/{datasource}{suffix}"))
}

/// Body for a DAX query request
pub fn execute_queries_body(params: &dyn ParameterSource, item: usize) -> Result<JsonValue> {
    let mut body = json!({
        "queries": [{ "query": params.required_str("daxQuery", item)? }],
    });
    if params.bool_or("includeNulls", item, false) {
        body["serializerSettings"] = json!({ "includeNulls": true });
    }
    if let Some(user) = params
        .opt_str("impersonatedUserName", item)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
    {
        body["impersonatedUserName"] = json!(user);
    }
    Ok(body)
}
