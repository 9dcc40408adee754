//! Tests for the Power BI node

use super::*;
use crate::auth::{Credential, StaticCredentials, POWERBI_CREDENTIAL, POWERBI_OAUTH2_CREDENTIAL};
use crate::config::Config;
use crate::dispatch::{ExecutionContext, Node};
use crate::error::{Error, Result};
use crate::options::{OptionItem, OptionLoader};
use crate::params::ItemParameters;
use crate::types::{JsonValue, OutputRecord};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

// ============================================================================
// Fixture
// ============================================================================

/// Records requested sleeps instead of waiting
#[derive(Default)]
struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn calls(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Answers with each body in turn, repeating the last one
struct Sequence {
    bodies: Vec<JsonValue>,
    calls: AtomicUsize,
}

impl Sequence {
    fn new(bodies: Vec<JsonValue>) -> Self {
        Self {
            bodies,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let body = &self.bodies[call.min(self.bodies.len() - 1)];
        ResponseTemplate::new(200).set_body_json(body)
    }
}

struct Fixture {
    server: MockServer,
    config: Config,
    credentials: StaticCredentials,
    sleeper: Arc<RecordingSleeper>,
}

impl Fixture {
    async fn start() -> Self {
        let server = MockServer::start().await;
        let mut config = Config::default();
        config.powerbi.base_url = format!("{}/v1", server.uri());
        let credentials = StaticCredentials::new()
            .with(
                POWERBI_CREDENTIAL,
                Credential::Bearer {
                    token: "pbi-token".to_string(),
                },
            )
            .with(
                POWERBI_OAUTH2_CREDENTIAL,
                Credential::Bearer {
                    token: "oauth-token".to_string(),
                },
            );
        Self {
            server,
            config,
            credentials,
            sleeper: Arc::new(RecordingSleeper::default()),
        }
    }

    fn node(&self) -> PowerBiNode {
        PowerBiNode::new().with_sleeper(self.sleeper.clone())
    }

    fn context<'a>(&'a self, params: &'a ItemParameters) -> ExecutionContext<'a> {
        ExecutionContext::new(params, &self.credentials, &self.config)
    }

    async fn run(&self, params: JsonValue) -> Result<OutputRecord> {
        let params = ItemParameters::from_json(params).unwrap();
        self.node().execute_item(&self.context(&params), 0).await
    }

    async fn load(&self, method: &str, params: JsonValue) -> Result<Vec<OptionItem>> {
        let params = ItemParameters::from_json(params).unwrap();
        PowerBiOptions.load(method, &self.context(&params)).await
    }

    async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}

fn export_params(extra: JsonValue) -> JsonValue {
    let mut params = json!({
        "resource": "report",
        "operation": "exportToFile",
        "groupId": "g1",
        "reportId": "r1",
        "exportFormat": "PDF",
        "additionalFields": { "pollingInterval": 5, "maxWaitTime": 60 },
    });
    if let (Some(target), JsonValue::Object(extra)) = (params.as_object_mut(), extra) {
        target.extend(extra);
    }
    params
}

// ============================================================================
// Helpers
// ============================================================================

#[test_case("", "/reports" ; "empty group")]
#[test_case("me", "/reports" ; "my workspace")]
#[test_case("g1", "/groups/g1/reports" ; "named group")]
fn test_group_path(group: &str, expected: &str) {
    assert_eq!(group_path(group, "/reports"), expected);
}

#[test]
fn test_credential_name() {
    assert_eq!(credential_name("apiKey"), POWERBI_CREDENTIAL);
    assert_eq!(credential_name("oAuth2"), POWERBI_OAUTH2_CREDENTIAL);
}

#[test]
fn test_extract_skip_token() {
    let link = "https://api.powerbi.com/v1.0/myorg/groups?$skiptoken=abc123&top=100";
    assert_eq!(extract_skip_token(link), Some("abc123".to_string()));
    assert_eq!(extract_skip_token("https://api.powerbi.com/v1.0/myorg/groups"), None);
}

#[test]
fn test_enhance_error_structured_body() {
    let body = json!({
        "error": { "code": "InvalidRequest", "message": "Bad group", "details": [{ "target": "groupId" }] }
    });
    let error = enhance_error(Error::http_status(400, body.to_string()));
    assert_eq!(
        error.to_string(),
        r#"Bad group [InvalidRequest]: [{"target":"groupId"}]"#
    );
    assert_eq!(error.status(), Some(400));
}

#[test]
fn test_enhance_error_passes_other_bodies() {
    let error = enhance_error(Error::http_status(502, "gateway down"));
    assert_eq!(error.to_string(), "HTTP 502: gateway down");
}

#[test_case(Some(".pdf"), "application/pdf")]
#[test_case(Some(".PNG"), "image/png")]
#[test_case(Some(".xlsx"), "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")]
#[test_case(Some(".csv"), "application/octet-stream")]
#[test_case(None, "application/octet-stream")]
fn test_mime_type(extension: Option<&str>, expected: &str) {
    assert_eq!(mime_type(extension), expected);
}

#[test]
fn test_export_body_power_bi_report() {
    let params = ItemParameters::from_json(json!({
        "exportFormat": "PDF",
        "powerBIReportConfig": {
            "includeHiddenPages": false,
            "locale": "en-US",
            "exportSpecificPages": true,
            "pages": "[{\"pageName\": \"ReportSection1\"}]",
            "useReportLevelFilters": true,
            "reportLevelFilters": [{ "filter": "Store/Territory eq 'NC'" }],
            "useDefaultBookmark": true,
            "defaultBookmarkName": "Q1",
            "useAlternativeDataset": false,
            "datasetToBind": "ignored",
        },
    }))
    .unwrap();

    let body = export_body(&params, 0).unwrap();
    assert_eq!(
        JsonValue::Object(body),
        json!({
            "format": "PDF",
            "powerBIReportConfiguration": {
                "settings": { "includeHiddenPages": false, "locale": "en-US" },
                "pages": [{ "pageName": "ReportSection1" }],
                "reportLevelFilters": [{ "filter": "Store/Territory eq 'NC'" }],
                "defaultBookmark": { "name": "Q1" },
            },
        })
    );
}

#[test]
fn test_export_body_bad_pages_json() {
    let params = ItemParameters::from_json(json!({
        "exportFormat": "PDF",
        "powerBIReportConfig": { "exportSpecificPages": true, "pages": "[{oops" },
    }))
    .unwrap();

    let err = export_body(&params, 0).unwrap_err();
    assert!(err.to_string().contains("Invalid JSON format for pages"), "{err}");
}

#[test]
fn test_export_body_paginated_report() {
    let params = ItemParameters::from_json(json!({
        "exportFormat": "XLSX",
        "reportType": "paginated",
        "locale": "de-DE",
        "useParameters": true,
        "parameterValues": "[{\"name\": \"Year\", \"value\": \"2024\"}]",
        "useFormatSettings": false,
        "formatSettings": "{\"PageHeight\": \"11in\"}",
    }))
    .unwrap();

    let body = export_body(&params, 0).unwrap();
    assert_eq!(
        JsonValue::Object(body),
        json!({
            "format": "XLSX",
            "paginatedReportConfiguration": {
                "locale": "de-DE",
                "parameterValues": [{ "name": "Year", "value": "2024" }],
            },
        })
    );
}

#[test]
fn test_execute_queries_body() {
    let params = ItemParameters::from_json(json!({
        "daxQuery": "EVALUATE Sales",
        "includeNulls": true,
        "impersonatedUserName": "  someone@example.com ",
    }))
    .unwrap();

    assert_eq!(
        execute_queries_body(&params, 0).unwrap(),
        json!({
            "queries": [{ "query": "EVALUATE Sales" }],
            "serializerSettings": { "includeNulls": true },
            "impersonatedUserName": "someone@example.com",
        })
    );
}

#[test]
fn test_export_job_keeps_status_when_other_fields_are_null() {
    let job = ExportJob::from_json(&json!({
        "id": "e1",
        "status": "Succeeded",
        "percentComplete": null,
        "reportName": null,
        "resourceFileExtension": ".pdf",
        "error": "not an object"
    }));
    assert_eq!(job.id.as_deref(), Some("e1"));
    assert_eq!(job.status, ExportStatus::Succeeded);
    assert_eq!(job.percent_complete, 0.0);
    assert_eq!(job.report_name, None);
    assert_eq!(job.resource_file_extension.as_deref(), Some(".pdf"));
    assert!(job.error.is_none());
}

#[tokio::test]
async fn test_export_succeeds_with_null_progress() {
    let fx = Fixture::start().await;
    mount_submit(&fx, json!({ "id": "e1", "status": "Running", "percentComplete": null })).await;
    mount_status(
        &fx,
        vec![json!({ "id": "e1", "status": "Succeeded", "percentComplete": null })],
    )
    .await;

    let record = fx.run(export_params(json!({}))).await.unwrap();
    assert_eq!(record.json["status"], "Succeeded");
    assert_eq!(fx.sleeper.calls().len(), 1);
}

#[test]
fn test_export_job_tolerates_unknown_status() {
    let job = ExportJob::from_json(&json!({ "id": "e1", "status": "Queued", "percentComplete": 10 }));
    assert_eq!(job.status, ExportStatus::Unknown);
    assert!(!job.status.is_terminal());
    assert_eq!(job.id.as_deref(), Some("e1"));
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_dataset_list_in_my_workspace() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/datasets"))
        .and(header("Authorization", "Bearer oauth-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [{ "id": "d1" }] })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let record = fx
        .run(json!({ "resource": "dataset", "operation": "list", "groupId": "me" }))
        .await
        .unwrap();
    assert_eq!(record.json, json!({ "value": [{ "id": "d1" }] }));
    assert_eq!(record.paired_item, Some(0));
}

#[tokio::test]
async fn test_bearer_token_authentication() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/g1/reports/r1/pages"))
        .and(header("Authorization", "Bearer pbi-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(1)
        .mount(&fx.server)
        .await;

    fx.run(json!({
        "authentication": "apiKey",
        "resource": "report",
        "operation": "getPages",
        "groupId": "g1",
        "reportId": "r1",
    }))
    .await
    .unwrap();
}

#[tokio::test]
async fn test_missing_credential_sends_nothing() {
    let mut fx = Fixture::start().await;
    fx.credentials = StaticCredentials::new().with(
        POWERBI_CREDENTIAL,
        Credential::Bearer {
            token: "pbi-token".to_string(),
        },
    );

    let err = fx
        .run(json!({ "resource": "group", "operation": "list" }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingCredential { ref name } if name == POWERBI_OAUTH2_CREDENTIAL));
    assert!(fx.requests().await.is_empty());
}

#[tokio::test]
async fn test_unsupported_operation() {
    let fx = Fixture::start().await;
    let err = fx
        .run(json!({ "resource": "dataset", "operation": "delete" }))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No handler registered for resource:operation \"dataset:delete\""
    );
    assert!(fx.requests().await.is_empty());
}

#[test]
fn test_operations_are_unique() {
    let keys = PowerBiNode::new().operations();
    let unique: std::collections::HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
    assert_eq!(keys.len(), PowerBiOperation::ALL.len());
}

#[tokio::test]
async fn test_dataset_refresh_sends_no_body() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/groups/g1/datasets/d1/refreshes"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&fx.server)
        .await;

    let record = fx
        .run(json!({ "resource": "dataset", "operation": "refresh", "groupId": "g1", "datasetId": "d1" }))
        .await
        .unwrap();
    assert_eq!(
        record.json,
        json!({ "success": true, "message": "Refresh started successfully" })
    );
    let requests = fx.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_refresh_history_top() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/datasets/d1/refreshes"))
        .and(query_param("$top", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(1)
        .mount(&fx.server)
        .await;

    fx.run(json!({ "resource": "dataset", "operation": "getRefreshHistory", "datasetId": "d1", "top": 5 }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_rows() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/groups/g1/datasets/d1/tables/Sales/rows"))
        .and(body_json(json!({ "rows": [{ "amount": 10 }] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&fx.server)
        .await;

    let record = fx
        .run(json!({
            "resource": "dataset",
            "operation": "addRows",
            "groupId": "g1",
            "datasetId": "d1",
            "tableName": "Sales",
            "data": "[{\"amount\": 10}]",
        }))
        .await
        .unwrap();
    assert_eq!(record.json["message"], "Rows added successfully");
}

#[tokio::test]
async fn test_add_rows_bad_json() {
    let fx = Fixture::start().await;
    let err = fx
        .run(json!({
            "resource": "dataset",
            "operation": "addRows",
            "datasetId": "d1",
            "tableName": "Sales",
            "data": "[{amount}",
        }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Could not parse rows JSON"), "{err}");
    assert!(fx.requests().await.is_empty());
}

#[tokio::test]
async fn test_admin_get_info_requires_workspaces() {
    let fx = Fixture::start().await;
    let err = fx
        .run(json!({ "resource": "admin", "operation": "getInfo", "workspaces": [] }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("You must select at least one workspace"));
}

#[tokio::test]
async fn test_admin_get_info_flags() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/admin/workspaces/getInfo"))
        .and(query_param("datasetSchema", "True"))
        .and(query_param("datasetExpressions", "True"))
        .and(query_param("lineage", "True"))
        .and(query_param("datasourceDetails", "False"))
        .and(body_json(json!({ "workspaces": ["w1", "w2"] })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "id": "scan1" })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let record = fx
        .run(json!({
            "resource": "admin",
            "operation": "getInfo",
            "workspaces": ["w1", "w2"],
            "lineage": true,
        }))
        .await
        .unwrap();
    assert_eq!(record.json["id"], "scan1");
}

#[tokio::test]
async fn test_dataflow_refresh() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/groups/g1/dataflows/df1/refreshes"))
        .and(query_param("processType", "default"))
        .and(body_json(json!({ "notifyOption": "NoNotification" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&fx.server)
        .await;

    let record = fx
        .run(json!({
            "resource": "dataflow",
            "operation": "refresh",
            "groupId": "g1",
            "dataflowId": "df1",
            "processType": "default",
        }))
        .await
        .unwrap();
    assert_eq!(record.json["message"], "Dataflow refresh triggered successfully");
}

#[test_case(403, "Access denied. Please verify that you have permissions to access this dataflow." ; "forbidden")]
#[test_case(404, "Dataflow not found. Please verify that the ID is correct." ; "not found")]
#[tokio::test]
async fn test_dataflow_get_status_messages(status: u16, expected: &str) {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/g1/dataflows/df1"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&fx.server)
        .await;

    let err = fx
        .run(json!({ "resource": "dataflow", "operation": "get", "groupId": "g1", "dataflowId": "df1" }))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), expected);
}

#[tokio::test]
async fn test_dataflow_requires_group() {
    let fx = Fixture::start().await;
    let err = fx
        .run(json!({ "resource": "dataflow", "operation": "list" }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingParameter { ref name, .. } if name == "groupId"));
}

#[tokio::test]
async fn test_gateway_datasource_status_path() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/gateways/gw1/datasources/ds1/status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&fx.server)
        .await;

    let record = fx
        .run(json!({
            "resource": "gateway",
            "operation": "getDatasourceStatus",
            "gatewayId": "gw1",
            "datasourceId": "ds1",
        }))
        .await
        .unwrap();
    assert_eq!(record.json, JsonValue::Null);
}

// ============================================================================
// Export
// ============================================================================

async fn mount_submit(fx: &Fixture, response: JsonValue) {
    Mock::given(method("POST"))
        .and(path("/v1/groups/g1/reports/r1/ExportTo"))
        .respond_with(ResponseTemplate::new(202).set_body_json(response))
        .expect(1)
        .mount(&fx.server)
        .await;
}

async fn mount_status(fx: &Fixture, bodies: Vec<JsonValue>) {
    Mock::given(method("GET"))
        .and(path("/v1/groups/g1/reports/r1/exports/e1"))
        .respond_with(Sequence::new(bodies))
        .mount(&fx.server)
        .await;
}

#[tokio::test]
async fn test_export_polls_until_succeeded() {
    let fx = Fixture::start().await;
    mount_submit(&fx, json!({ "id": "e1", "status": "Running", "percentComplete": 0 })).await;
    mount_status(
        &fx,
        vec![
            json!({ "id": "e1", "status": "Running", "percentComplete": 50 }),
            json!({ "id": "e1", "status": "Succeeded", "percentComplete": 100 }),
        ],
    )
    .await;

    let record = fx.run(export_params(json!({}))).await.unwrap();
    assert_eq!(record.json["status"], "Succeeded");
    assert!(record.binary.is_none());
    assert_eq!(fx.sleeper.calls(), vec![Duration::from_secs(5); 2]);
    assert_eq!(fx.requests().await.len(), 3);
}

#[tokio::test]
async fn test_export_timeout_reports_progress() {
    let fx = Fixture::start().await;
    mount_submit(&fx, json!({ "id": "e1", "status": "NotStarted" })).await;
    mount_status(&fx, vec![json!({ "id": "e1", "status": "Running", "percentComplete": 40 })]).await;

    let err = fx
        .run(export_params(json!({
            "additionalFields": { "pollingInterval": 5, "maxWaitTime": 10 },
        })))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ExportTimeout {
            max_wait_secs: 10,
            elapsed_secs: 10,
            percent_complete: 40
        }
    ));
    assert!(err.to_string().contains("Progress: 40%"));
    assert_eq!(fx.sleeper.calls().len(), 2);
}

#[tokio::test]
async fn test_export_failed_job() {
    let fx = Fixture::start().await;
    mount_submit(&fx, json!({ "id": "e1", "status": "Running" })).await;
    mount_status(
        &fx,
        vec![json!({ "id": "e1", "status": "Failed", "error": { "code": "E1", "message": "Capacity overloaded" } })],
    )
    .await;

    let err = fx.run(export_params(json!({}))).await.unwrap_err();
    assert_eq!(err.to_string(), "Report export failed: Capacity overloaded");
}

#[tokio::test]
async fn test_export_failed_without_message() {
    let fx = Fixture::start().await;
    mount_submit(&fx, json!({ "id": "e1", "status": "Failed" })).await;

    let err = fx.run(export_params(json!({}))).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Report export failed: Timeout exceeded or unknown error"
    );
    assert!(fx.sleeper.calls().is_empty());
}

#[tokio::test]
async fn test_export_downloads_file() {
    let fx = Fixture::start().await;
    let location = format!("{}/v1/groups/g1/reports/r1/exports/e1/file", fx.server.uri());
    mount_submit(&fx, json!({ "id": "e1", "status": "Running" })).await;
    mount_status(
        &fx,
        vec![json!({
            "id": "e1",
            "status": "Succeeded",
            "percentComplete": 100,
            "resourceLocation": location,
            "resourceFileExtension": ".pdf",
            "reportName": "Sales",
        })],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/g1/reports/r1/exports/e1/file"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"PDFDATA".to_vec()),
        )
        .expect(1)
        .mount(&fx.server)
        .await;

    let record = fx
        .run(export_params(json!({ "downloadFile": true })))
        .await
        .unwrap();
    let binary = record.binary.expect("binary attached");
    assert_eq!(binary.bytes, b"PDFDATA".to_vec());
    assert_eq!(binary.mime_type, "application/pdf");
    assert_eq!(binary.file_name, "Sales.pdf");
    assert_eq!(record.json["fileBase64"], "UERGREFUQQ==");
}

#[tokio::test]
async fn test_export_without_waiting() {
    let fx = Fixture::start().await;
    mount_submit(&fx, json!({ "id": "e1", "status": "NotStarted" })).await;

    let record = fx
        .run(export_params(json!({ "waitForCompletion": false })))
        .await
        .unwrap();
    assert_eq!(record.json, json!({ "id": "e1", "status": "NotStarted" }));
    assert_eq!(fx.requests().await.len(), 1);
}

#[tokio::test]
async fn test_export_feature_not_available() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/groups/g1/reports/r1/ExportTo"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": "FeatureNotAvailableError", "message": "Not on this capacity" }
        })))
        .mount(&fx.server)
        .await;

    let err = fx.run(export_params(json!({}))).await.unwrap_err();
    assert!(matches!(err, Error::ExportFailed { .. }));
    assert!(err.to_string().contains("Not on this capacity"), "{err}");
}

// ============================================================================
// Paging and Loaders
// ============================================================================

#[tokio::test]
async fn test_groups_follow_next_link() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups"))
        .and(query_param("skiptoken", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": "g2", "name": "Finance" }]
        })))
        .with_priority(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/groups"))
        .and(query_param("top", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": "g1", "name": "Sales" }, { "id": "", "name": "Broken" }],
            "nextLink": "https://api.powerbi.com/v1.0/myorg/groups?$skiptoken=page2",
        })))
        .mount(&fx.server)
        .await;

    let options = fx.load("getGroups", json!({})).await.unwrap();
    assert_eq!(
        options,
        vec![
            OptionItem::new("My Workspace", "me"),
            OptionItem::new("Sales", "g1"),
            OptionItem::new("Finance", "g2"),
        ]
    );
    assert_eq!(fx.requests().await.len(), 2);
}

#[tokio::test]
async fn test_repeated_skip_token_stops_paging() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": "g1", "name": "Sales" }],
            "nextLink": "https://api.powerbi.com/v1.0/myorg/groups?$skiptoken=same",
        })))
        .mount(&fx.server)
        .await;

    let options = fx.load("getGroupsMultiSelect", json!({})).await.unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(fx.requests().await.len(), 2);
}

#[test_case("getDatasets", json!({}), "Select a group first" ; "datasets")]
#[test_case("getReports", json!({}), "Select a group first" ; "reports")]
#[test_case("getTables", json!({ "groupId": "g1" }), "Select a group and dataset first" ; "tables")]
#[test_case("getDatasources", json!({}), "-- Select a gateway first --" ; "datasources")]
#[test_case("getDataflows", json!({}), "Select a workspace first" ; "dataflows")]
#[tokio::test]
async fn test_loader_placeholders(method_name: &str, params: JsonValue, expected: &str) {
    let fx = Fixture::start().await;
    let options = fx.load(method_name, params).await.unwrap();
    assert_eq!(options, vec![OptionItem::placeholder(expected)]);
    assert!(fx.requests().await.is_empty());
}

#[tokio::test]
async fn test_dashboards_use_display_name() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/g1/dashboards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": "db1", "displayName": "Overview" }]
        })))
        .mount(&fx.server)
        .await;

    let options = fx.load("getDashboards", json!({ "groupId": "g1" })).await.unwrap();
    assert_eq!(options, vec![OptionItem::new("Overview", "db1")]);
}

#[tokio::test]
async fn test_tables_use_name_as_value() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/datasets/d1/tables"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "name": "Sales" }]
        })))
        .mount(&fx.server)
        .await;

    let options = fx
        .load("getTables", json!({ "groupId": "me", "datasetId": "d1" }))
        .await
        .unwrap();
    assert_eq!(options, vec![OptionItem::new("Sales", "Sales")]);
}

#[tokio::test]
async fn test_gateways_error_is_empty() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/gateways"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&fx.server)
        .await;

    assert!(fx.load("getGateways", json!({})).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_datasources_naming_and_errors() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/gateways/gw1/datasources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": "ds1", "datasourceName": "Warehouse", "datasourceType": "Sql" }]
        })))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/gateways/gw2/datasources"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&fx.server)
        .await;

    let ok = fx.load("getDatasources", json!({ "gatewayId": "gw1" })).await.unwrap();
    assert_eq!(ok, vec![OptionItem::new("Warehouse (Sql)", "ds1")]);

    let failed = fx.load("getDatasources", json!({ "gatewayId": "gw2" })).await.unwrap();
    assert_eq!(
        failed,
        vec![OptionItem::placeholder("Error loading data sources. Check permissions.")]
    );
}

#[test_case(json!({ "value": [] }), "No dataflow found in this workspace" ; "empty")]
#[test_case(json!({ "items": [] }), "API response does not contain dataflows" ; "no value")]
#[test_case(json!({ "value": [{ "name": "Nightly", "id": "x" }] }), "No valid dataflow found" ; "no object id")]
#[tokio::test]
async fn test_dataflow_loader_messages(response: JsonValue, expected: &str) {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/g1/dataflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&fx.server)
        .await;

    let options = fx.load("getDataflows", json!({ "groupId": "g1" })).await.unwrap();
    assert_eq!(options, vec![OptionItem::placeholder(expected)]);
}

#[tokio::test]
async fn test_dataflow_loader_entries_and_failure() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/g1/dataflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "name": "Nightly", "objectId": "df1" }]
        })))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/g2/dataflows"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&fx.server)
        .await;

    let ok = fx.load("getDataflows", json!({ "groupId": "g1" })).await.unwrap();
    assert_eq!(ok, vec![OptionItem::new("Nightly", "df1")]);

    let failed = fx.load("getDataflows", json!({ "groupId": "g2" })).await.unwrap();
    assert_eq!(
        failed,
        vec![OptionItem::placeholder("Error loading dataflows: HTTP 500: boom")]
    );
}

#[tokio::test]
async fn test_unknown_loader_method() {
    let fx = Fixture::start().await;
    let err = fx.load("getEverything", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::UnknownOptionsMethod { .. }));
}
