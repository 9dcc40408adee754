//! Cekat webhook triggers
//!
//! Chat, CRM and order triggers subscribe a webhook URL to events. The AI
//! tool trigger instead registers the URL as a tool callable by AI agents.

use super::client::{CekatClient, UrlVariant};
use crate::dispatch::ExecutionContext;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::params::ParameterSourceExt;
use crate::trigger::{WebhookContext, WebhookTrigger};
use crate::types::{is_truthy, JsonObject, JsonValue, OutputRecord};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

const WEBHOOKS_PATH: &str = "/business_workflows/webhooks";

async fn has_webhooks(client: &CekatClient, request: ApiRequest) -> Result<bool> {
    let response = client.call(UrlVariant::Server, request).await?;
    Ok(response.as_array().is_some_and(|hooks| !hooks.is_empty()))
}

async fn post(client: &CekatClient, path: &str, body: JsonValue) -> Result<bool> {
    client
        .call(UrlVariant::Server, ApiRequest::post(path).json(body))
        .await?;
    Ok(true)
}

// ============================================================================
// Chat
// ============================================================================

/// Chat events for one inbox (`cekatTrigger`)
#[derive(Debug, Clone, Copy, Default)]
pub struct CekatTrigger;

impl CekatTrigger {
    fn subscription(ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> JsonValue {
        json!({
            "events": ctx.params.array_or_empty("events", 0),
            "webhookUrl": hook.webhook_url,
            "inboxId": ctx.params.str_or("inbox_id", 0, ""),
        })
    }
}

#[async_trait]
impl WebhookTrigger for CekatTrigger {
    fn name(&self) -> &'static str {
        "cekatTrigger"
    }

    async fn check_exists(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
        let client = CekatClient::from_context(ctx).await?;
        let request = ApiRequest::get(WEBHOOKS_PATH)
            .query("webhookUrl", hook.webhook_url.as_str())
            .query("inboxId", ctx.params.str_or("inbox_id", 0, ""));
        has_webhooks(&client, request).await
    }

    async fn create(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
        let client = CekatClient::from_context(ctx).await?;
        post(&client, "/business_workflows/webhooks/subscribe", Self::subscription(ctx, hook)).await
    }

    async fn delete(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
        let client = CekatClient::from_context(ctx).await?;
        post(&client, "/business_workflows/webhooks/unsubscribe", Self::subscription(ctx, hook)).await
    }
}

// ============================================================================
// CRM and Order
// ============================================================================

/// CRM board events (`cekatCrmTrigger`)
#[derive(Debug, Clone, Copy, Default)]
pub struct CekatCrmTrigger;

#[async_trait]
impl WebhookTrigger for CekatCrmTrigger {
    fn name(&self) -> &'static str {
        "cekatCrmTrigger"
    }

    async fn check_exists(&self, ctx: &ExecutionContext<'_>, _hook: &WebhookContext) -> Result<bool> {
        let client = CekatClient::from_context(ctx).await?;
        has_webhooks(&client, ApiRequest::get(WEBHOOKS_PATH)).await
    }

    async fn create(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
        let mut payload = named_subscription("N8N CRM Webhook", ctx, hook);
        if let Some(board_id) = ctx.params.opt_str("board_id", 0) {
            payload.insert("boardId".into(), json!(board_id));
        }
        let client = CekatClient::from_context(ctx).await?;
        post(&client, "/business_workflows/webhooks/subscribe", JsonValue::Object(payload)).await
    }

    async fn delete(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
        unsubscribe_url(ctx, hook).await
    }
}

/// Order events (`cekatOrderTrigger`)
#[derive(Debug, Clone, Copy, Default)]
pub struct CekatOrderTrigger;

#[async_trait]
impl WebhookTrigger for CekatOrderTrigger {
    fn name(&self) -> &'static str {
        "cekatOrderTrigger"
    }

    async fn check_exists(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
        let client = CekatClient::from_context(ctx).await?;
        let request = ApiRequest::get(WEBHOOKS_PATH).query("webhookUrl", hook.webhook_url.as_str());
        has_webhooks(&client, request).await
    }

    async fn create(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
        let mut payload = named_subscription("N8N Order Webhook", ctx, hook);
        if let Some(filters) = order_filters(&ctx.params.object_or_empty("orderFilter", 0)) {
            payload.insert("filters".into(), JsonValue::Object(filters));
        }
        let client = CekatClient::from_context(ctx).await?;
        post(&client, "/business_workflows/webhooks/subscribe", JsonValue::Object(payload)).await
    }

    async fn delete(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
        unsubscribe_url(ctx, hook).await
    }
}

fn named_subscription(name: &str, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> JsonObject {
    let mut payload = JsonObject::new();
    payload.insert("name".into(), json!(name));
    payload.insert("webhookUrl".into(), json!(hook.webhook_url));
    payload.insert("events".into(), JsonValue::Array(ctx.params.array_or_empty("events", 0)));
    payload
}

async fn unsubscribe_url(ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
    let client = CekatClient::from_context(ctx).await?;
    post(
        &client,
        "/business_workflows/webhooks/unsubscribe",
        json!({ "webhookUrl": hook.webhook_url }),
    )
    .await
}

/// Snake-cased filters from the optional order filter collection
///
/// `None` when the collection is empty; blank values are left out.
pub(crate) fn order_filters(filter: &JsonObject) -> Option<JsonObject> {
    if filter.is_empty() {
        return None;
    }
    let mut filters = JsonObject::new();
    for (param, key) in [
        ("paymentMethod", "payment_method"),
        ("orderStatus", "order_status"),
        ("paymentStatus", "payment_status"),
    ] {
        if let Some(value) = filter.get(param).filter(|v| is_truthy(v)) {
            filters.insert(key.into(), value.clone());
        }
    }
    Some(filters)
}

// ============================================================================
// AI Tool
// ============================================================================

/// Registers the workflow as a tool for AI agents (`cekatAiToolTrigger`)
#[derive(Debug, Clone, Copy, Default)]
pub struct CekatAiToolTrigger;

#[async_trait]
impl WebhookTrigger for CekatAiToolTrigger {
    fn name(&self) -> &'static str {
        "cekatAiToolTrigger"
    }

    async fn check_exists(&self, _ctx: &ExecutionContext<'_>, _hook: &WebhookContext) -> Result<bool> {
        Ok(false)
    }

    async fn create(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
        let body = json!({
            "ai_agent_ids": ctx.params.array_or_empty("agentIds", 0),
            "name": ctx.params.required_str("toolName", 0)?,
            "description": ctx.params.str_or("toolDescription", 0, ""),
            "ai_inputs": ai_inputs(&ctx.params.array_or_empty("aiInputs.input", 0)),
            "webhook_url": hook.webhook_url,
            "workflow_id": hook.workflow.id,
        });
        info!(workflow_id = %hook.workflow.id, "Registering AI tool");
        let client = CekatClient::from_context(ctx).await?;
        post(&client, "/business_workflows/ai-tools/create", body).await
    }

    async fn delete(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool> {
        let client = CekatClient::from_context(ctx).await?;
        post(
            &client,
            "/business_workflows/ai-tools/delete",
            json!({ "webhook_url": hook.webhook_url }),
        )
        .await
    }

    fn webhook(&self, body: JsonValue, hook: &WebhookContext) -> Vec<OutputRecord> {
        vec![OutputRecord::new(json!({
            "body": body,
            "context": {
                "workflowName": hook.workflow.name,
                "workflowId": hook.workflow.id,
                "workflowIsActive": hook.workflow.active,
            },
        }))]
    }
}

/// Flatten each input's `enum.values[].value` into a plain `enum` list
///
/// `null` when no inputs are defined.
pub(crate) fn ai_inputs(inputs: &[JsonValue]) -> JsonValue {
    if inputs.is_empty() {
        return JsonValue::Null;
    }
    inputs
        .iter()
        .map(|input| {
            let mut entry = input.as_object().cloned().unwrap_or_default();
            let values: Option<Vec<JsonValue>> = input
                .pointer("/enum/values")
                .and_then(JsonValue::as_array)
                .map(|values| values.iter().filter_map(|v| v.get("value").cloned()).collect());
            match values {
                Some(values) => entry.insert("enum".into(), JsonValue::Array(values)),
                None => entry.remove("enum"),
            };
            JsonValue::Object(entry)
        })
        .collect()
}
