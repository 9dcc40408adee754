//! Integration tests using mock HTTP server
//!
//! Tests the full flow: config file → registry node → engine item loop →
//! upstream requests → output records

use cekat_nodes::auth::{StaticCredentials, CEKAT_CREDENTIAL};
use cekat_nodes::cli::router;
use cekat_nodes::config::Config;
use cekat_nodes::dispatch::ExecutionContext;
use cekat_nodes::engine::{Engine, ExecutionConfig};
use cekat_nodes::params::ItemParameters;
use cekat_nodes::trigger::WebhookContext;
use cekat_nodes::{registry, Error};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

/// Config file pointing every Cekat host at the mock server
fn write_config(server: &MockServer, continue_on_fail: bool) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "cekat:\n  base_urls:\n    server: \"{uri}\"\n    api: \"{uri}\"\n    staging: \"{uri}\"\n\
         execution:\n  continue_on_fail: {continue_on_fail}",
        uri = server.uri()
    )
    .unwrap();
    file
}

/// Credentials file holding the Cekat API key
fn write_credentials() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    let body = json!({ (CEKAT_CREDENTIAL): { "type": "api_key", "api_key": "it-key" } });
    write!(file, "{body}").unwrap();
    file
}

async fn run_crm(server: &MockServer, items: Value, continue_on_fail: bool) -> cekat_nodes::Result<Vec<Value>> {
    let config_file = write_config(server, continue_on_fail);
    let credentials_file = write_credentials();
    let config = Config::from_path(config_file.path()).unwrap();
    let credentials = StaticCredentials::from_path(credentials_file.path()).unwrap();
    let params = ItemParameters::from_json(items).unwrap();

    let node = registry::node("cekatCrm").unwrap();
    let engine = Engine::new().with_config(ExecutionConfig::from(&config.execution));
    let ctx = ExecutionContext::new(&params, &credentials, &config);
    let output = engine.execute(node.as_ref(), &ctx).await?;
    Ok(output.records.into_iter().map(|r| serde_json::to_value(r).unwrap()).collect())
}

fn get_board(board_id: &str) -> Value {
    json!({ "resource": "lookup", "operation": "getBoard", "boardId": board_id })
}

// ============================================================================
// Engine Integration Tests
// ============================================================================

#[tokio::test]
async fn test_items_run_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/crm/boards/slow"))
        .and(header("api_key", "it-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "slow" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/crm/boards/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "fast" })))
        .expect(1)
        .mount(&server)
        .await;

    let records = run_crm(&server, json!([get_board("slow"), get_board("fast")]), false)
        .await
        .unwrap();

    let ids: Vec<&Value> = records.iter().map(|r| &r["json"]["response"]["id"]).collect();
    assert_eq!(ids, vec![&json!("slow"), &json!("fast")]);
    assert_eq!(records[0]["pairedItem"], 0);
    assert_eq!(records[1]["pairedItem"], 1);

    // The second request must not start before the first finished
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.path(), "/api/crm/boards/slow");
    assert_eq!(requests[1].url.path(), "/api/crm/boards/fast");
}

#[tokio::test]
async fn test_failure_aborts_without_continue_on_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/crm/boards/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/crm/boards/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "ok" })))
        .expect(0)
        .mount(&server)
        .await;

    let err = run_crm(&server, json!([get_board("broken"), get_board("ok")]), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_continue_on_fail_keeps_item_slots() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/crm/boards/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/crm/boards/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "ok" })))
        .mount(&server)
        .await;

    let records = run_crm(
        &server,
        json!([get_board("broken"), get_board("ok"), { "resource": "lookup", "operation": "nope" }]),
        true,
    )
    .await
    .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["json"]["error"], "HTTP 500: boom");
    assert_eq!(records[1]["json"]["response"]["id"], "ok");
    assert_eq!(
        records[2]["json"]["error"],
        "No handler registered for resource:operation \"lookup:nope\""
    );
    assert_eq!(records[2]["pairedItem"], 2);
}

#[tokio::test]
async fn test_missing_credential_is_configuration_error() {
    let params = ItemParameters::from_json(json!([get_board("b1")])).unwrap();
    let credentials = StaticCredentials::new();
    let config = Config::default();
    let ctx = ExecutionContext::new(&params, &credentials, &config);

    let node = registry::node("cekatCrm").unwrap();
    let err = Engine::new().execute(node.as_ref(), &ctx).await.unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_every_node_lists_its_operations() {
    for info in registry::NODES {
        let node = registry::node(info.name).unwrap();
        for key in node.operations() {
            assert!(!key.resource.is_empty() && !key.operation.is_empty(), "{key}");
        }
    }
}

// ============================================================================
// Webhook Receiver
// ============================================================================

#[tokio::test]
async fn test_webhook_receiver_shapes_payload() {
    let trigger = registry::trigger("cekatTrigger").unwrap();
    let app = router(trigger, WebhookContext::new("http://localhost/webhook"));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let health: Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({ "status": "ok" }));

    let response = client
        .post(format!("http://{addr}/webhook"))
        .json(&json!({ "event": "message.created", "data": { "id": "m1" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "received": 1 }));
}
