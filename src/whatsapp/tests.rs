//! Tests for the WhatsApp node

use super::*;
use crate::auth::{Credential, StaticCredentials, WHATSAPP_CREDENTIAL};
use crate::config::Config;
use crate::dispatch::{ExecutionContext, Node};
use crate::error::{Error, Result};
use crate::params::ItemParameters;
use crate::types::{JsonValue, Method, OutputRecord};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test_case("+99-(000)-111-2222", "990001112222" ; "punctuation")]
#[test_case("", "" ; "empty")]
#[test_case("990001112222", "990001112222" ; "already clean")]
#[test_case("+99 000 111 2222", "99 000 111 2222" ; "spaces kept")]
fn test_sanitize_phone_number(input: &str, expected: &str) {
    assert_eq!(sanitize_phone_number(input), expected);
}

fn approval_config(options: Vec<ApprovalOption>) -> SendAndWaitConfig {
    SendAndWaitConfig {
        title: String::new(),
        message: "Please approve an option:".to_string(),
        url: "https://example.com/approve".to_string(),
        options,
    }
}

#[test]
fn test_create_message_lists_every_option() {
    let config = approval_config(vec![
        ApprovalOption::new("Yes", "yes", "primary"),
        ApprovalOption::new("No", "no", "secondary"),
    ]);

    let request = create_message(&config, "123456789", "990001112222");
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "123456789/messages");
    assert_eq!(
        request.body,
        Some(json!({
            "messaging_product": "whatsapp",
            "to": "990001112222",
            "type": "text",
            "text": {
                "body": "Please approve an option:\n\n\
                         *Yes:*\n_https://example.com/approve?approved=yes_\n\n\
                         *No:*\n_https://example.com/approve?approved=no_\n\n",
            },
        }))
    );
}

#[test]
fn test_create_message_single_option() {
    let mut config = approval_config(vec![ApprovalOption::new("Confirm", "confirm", "")]);
    config.message = "Choose an option:".to_string();

    assert_eq!(
        config.body_text(),
        "Choose an option:\n\n*Confirm:*\n_https://example.com/approve?approved=confirm_\n\n"
    );
}

#[test]
fn test_approval_options_from_params() {
    let params = ItemParameters::from_json(json!({
        "message": "Ship it?",
        "approvalOptions": {
            "values": { "approvalType": "double", "approveLabel": "Ship", "disapproveLabel": "" },
        },
    }))
    .unwrap();

    let config = SendAndWaitConfig::from_params(&params, 0, "http://hook".to_string()).unwrap();
    assert_eq!(
        config.options,
        vec![
            ApprovalOption::new("Ship", "true", "primary"),
            ApprovalOption::new("Decline", "false", "secondary"),
        ]
    );
}

struct Fixture {
    server: MockServer,
    config: Config,
    credentials: StaticCredentials,
}

impl Fixture {
    async fn start() -> Self {
        let server = MockServer::start().await;
        let mut config = Config::default();
        config.whatsapp.base_url = format!("{}/v13.0/", server.uri());
        let credentials = StaticCredentials::new().with(
            WHATSAPP_CREDENTIAL,
            Credential::Bearer {
                token: "wa-token".to_string(),
            },
        );
        Self {
            server,
            config,
            credentials,
        }
    }

    async fn run(&self, params: JsonValue) -> Result<OutputRecord> {
        let params = ItemParameters::from_json(params).unwrap();
        let ctx = ExecutionContext::new(&params, &self.credentials, &self.config);
        WhatsAppNode.execute_item(&ctx, 0).await
    }
}

#[tokio::test]
async fn test_send_and_wait_posts_approval_message() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path("/v13.0/11111/messages"))
        .and(header("Authorization", "Bearer wa-token"))
        .and(body_json(json!({
            "messaging_product": "whatsapp",
            "to": "22222",
            "type": "text",
            "text": {
                "body": "my message\n\n*Approve:*\n_http://localhost/waiting-webhook/nodeID?approved=true_\n\n",
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": [{ "id": "wamid.1" }] })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let record = fx
        .run(json!({
            "resource": "message",
            "operation": "sendAndWait",
            "phoneNumberId": "11111",
            "recipientPhoneNumber": "22222",
            "message": "my message",
            "approvalOptions": { "values": {} },
            "resumeUrl": "http://localhost/waiting-webhook/nodeID",
        }))
        .await
        .unwrap();
    assert_eq!(record.json["status"], "waiting");
    assert_eq!(record.json["response"]["messages"][0]["id"], "wamid.1");
}

#[tokio::test]
async fn test_send_text_sanitizes_recipient() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path("/v13.0/11111/messages"))
        .and(body_json(json!({
            "messaging_product": "whatsapp",
            "to": "6281234",
            "type": "text",
            "text": { "body": "hello", "preview_url": true },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let record = fx
        .run(json!({
            "resource": "message",
            "operation": "send",
            "phoneNumberId": "11111",
            "recipientPhoneNumber": "+62-81234",
            "textBody": "hello",
            "additionalFields": { "previewUrl": true },
        }))
        .await
        .unwrap();
    assert_eq!(record.json, json!({ "ok": true }));
}

#[tokio::test]
async fn test_unknown_operation_sends_nothing() {
    let fx = Fixture::start().await;
    let err = fx
        .run(json!({ "resource": "message", "operation": "sendTemplate" }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation { .. }));
    assert!(fx.server.received_requests().await.unwrap_or_default().is_empty());
}
