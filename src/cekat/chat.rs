//! Cekat chat node (`cekat`)
//!
//! Lookups, contact data, webhook subscriptions, conversation actions and
//! WhatsApp messages. Each handler returns the upstream response as the
//! item's JSON.

use super::client::{CekatClient, UrlVariant};
use super::message;
use crate::dispatch::{operation_table, selected_operation, ExecutionContext, Node, OperationKey};
use crate::error::Result;
use crate::http::ApiRequest;
use crate::params::ParameterSourceExt;
use crate::types::{value_to_string, JsonObject, JsonValue, OutputRecord};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

operation_table! {
    /// Operations of the Cekat chat node
    pub enum ChatOperation {
        GetMessages => ("lookup", "getMessages"),
        GetTemplates => ("lookup", "getTemplates"),
        GetLabels => ("lookup", "getLabels"),
        GetInboxes => ("lookup", "getInboxes"),
        GetAgents => ("lookup", "getAgents"),
        GetPipelineStatuses => ("lookup", "getPipelineStatuses"),
        GetSubscribedWebhooks => ("lookup", "getSubscribedWebhooks"),
        UpdateAdditionalData => ("contact", "updateAdditionalData"),
        SubscribeWebhook => ("webhook", "subscribe"),
        UnsubscribeWebhook => ("webhook", "unsubscribe"),
        ResolveConversation => ("conversation", "resolveConversation"),
        AssignAgent => ("conversation", "assignAgent"),
        AddCollaborator => ("conversation", "addCollaborator"),
        ChangeStageStatus => ("conversation", "changeStageStatus"),
        SetPipelineStatus => ("conversation", "setPipelineStatus"),
        BlockAi => ("conversation", "blockAI"),
        UnblockAi => ("conversation", "unblockAI"),
        RemoveLabel => ("conversation", "removeLabel"),
        AssignAiAgent => ("conversation", "assignAiAgent"),
        SendMessage => ("message", "sendMessage"),
        SendTemplateMessage => ("message", "sendTemplateMessage"),
    }
}

impl ChatOperation {
    /// Resolve a pair, accepting the older `lookup:getAllTemplates` name
    pub fn resolve(resource: &str, operation: &str) -> Result<Self> {
        match (resource, operation) {
            ("lookup", "getAllTemplates") => Ok(ChatOperation::GetTemplates),
            _ => Self::parse(resource, operation),
        }
    }
}

/// The Cekat chat node
#[derive(Debug, Clone, Copy, Default)]
pub struct CekatNode;

#[async_trait]
impl Node for CekatNode {
    fn name(&self) -> &'static str {
        "cekat"
    }

    fn operations(&self) -> Vec<OperationKey> {
        ChatOperation::ALL.iter().map(|op| op.key()).collect()
    }

    async fn execute_item(&self, ctx: &ExecutionContext<'_>, item: usize) -> Result<OutputRecord> {
        let (resource, operation) = selected_operation(ctx, item)?;
        let op = ChatOperation::resolve(&resource, &operation)?;
        debug!(item, key = %op.key(), "Dispatching Cekat operation");

        let client = CekatClient::from_context(ctx).await?;
        let response = match op {
            ChatOperation::GetMessages => {
                let conversation_id = ctx.params.required_str("conversationId", item)?;
                let request = ApiRequest::get("/business_workflows/conversation-messages")
                    .query("conversation_id", conversation_id);
                client.call(UrlVariant::Server, request).await?
            }
            ChatOperation::GetTemplates => {
                let inbox_id = ctx.params.required_str("inboxId", item)?;
                let request = ApiRequest::get("/templates").query("inbox_id", inbox_id);
                client.call(UrlVariant::Api, request).await?
            }
            ChatOperation::GetLabels => lookup(&client, "/business_workflows/labels").await?,
            ChatOperation::GetInboxes => lookup(&client, "/business_workflows/inboxes").await?,
            ChatOperation::GetAgents => lookup(&client, "/business_workflows/agents").await?,
            ChatOperation::GetPipelineStatuses => {
                lookup(&client, "/business_workflows/pipeline-status").await?
            }
            ChatOperation::GetSubscribedWebhooks => {
                lookup(&client, "/business_workflows/webhooks").await?
            }
            ChatOperation::UpdateAdditionalData => {
                update_additional_data(&client, ctx, item).await?
            }
            ChatOperation::SubscribeWebhook => {
                webhook_subscription(&client, ctx, item, "subscribe").await?
            }
            ChatOperation::UnsubscribeWebhook => {
                webhook_subscription(&client, ctx, item, "unsubscribe").await?
            }
            ChatOperation::ResolveConversation => {
                let body = json!({ "conversation_id": ctx.params.required_str("conversationId", item)? });
                let request = ApiRequest::post("/business_workflows/conversation/resolve")
                    .header("Authorization", format!("Bearer {}", client.api_key()))
                    .json(body);
                client.call(UrlVariant::Server, request).await?
            }
            ChatOperation::AssignAgent => {
                let body = conversation_agent_body(ctx, item)?;
                post(&client, "/business_workflows/conversation/assign-agent", body).await?
            }
            ChatOperation::AddCollaborator => {
                let body = conversation_agent_body(ctx, item)?;
                post(&client, "/business_workflows/add-collaborator", body).await?
            }
            ChatOperation::ChangeStageStatus => {
                let body = json!({
                    "conversation_id": ctx.params.required_str("conversationId", item)?,
                    "pipeline_status_id": ctx.params.required_str("pipelineStatusId", item)?,
                });
                let request = ApiRequest::post("/business_workflows/conversation/update-stage-status")
                    .header("Authorization", format!("Bearer {}", client.api_key()))
                    .json(body);
                client.call(UrlVariant::Server, request).await?
            }
            ChatOperation::SetPipelineStatus => {
                let body = json!({
                    "pipeline_status_id": ctx.params.required_str("pipelineStatusId", item)?,
                    "conversation_id": ctx.params.required_str("conversationId", item)?,
                });
                post(&client, "/business_workflows/pipeline-status", body).await?
            }
            ChatOperation::BlockAi => {
                let body = json!({ "conversation_id": ctx.params.required_str("conversationId", item)? });
                post(&client, "/business_workflows/block-ai", body).await?
            }
            ChatOperation::UnblockAi => {
                let body = json!({ "conversation_id": ctx.params.required_str("conversationId", item)? });
                post(&client, "/business_workflows/unblock-ai", body).await?
            }
            ChatOperation::RemoveLabel => {
                let body = json!({
                    "conversation_id": ctx.params.required_str("conversationId", item)?,
                    "label_id": ctx.params.required_str("labelId", item)?,
                });
                post(&client, "/business_workflows/labels/remove", body).await?
            }
            ChatOperation::AssignAiAgent => {
                let conversation_id = ctx.params.required_str("conversationId", item)?;
                let body = json!({
                    "assigned_ai_agent": ctx.params.required_str("agentId", item)?,
                    "keep_assigned_ai_agent_on_resolve": ctx.params.bool_or("keepAssigned", item, false),
                });
                let request = ApiRequest::put(format!("/api/conversations/{conversation_id}")).json(body);
                client.call(UrlVariant::Server, request).await?
            }
            ChatOperation::SendMessage => {
                let body = message::build_message_body(ctx.params, item)?;
                let request = ApiRequest::post("/messages/whatsapp").json(body);
                client.call(UrlVariant::Api, request).await?
            }
            ChatOperation::SendTemplateMessage => {
                message::send_template_message(&client, ctx.params, item).await?
            }
        };

        Ok(OutputRecord::paired(response, item))
    }
}

async fn lookup(client: &CekatClient, path: &str) -> Result<JsonValue> {
    client.call(UrlVariant::Server, ApiRequest::get(path)).await
}

async fn post(client: &CekatClient, path: &str, body: JsonValue) -> Result<JsonValue> {
    client
        .call(UrlVariant::Server, ApiRequest::post(path).json(body))
        .await
}

fn conversation_agent_body(ctx: &ExecutionContext<'_>, item: usize) -> Result<JsonValue> {
    Ok(json!({
        "conversation_id": ctx.params.required_str("conversationId", item)?,
        "agent_id": ctx.params.required_str("agentId", item)?,
    }))
}

async fn update_additional_data(
    client: &CekatClient,
    ctx: &ExecutionContext<'_>,
    item: usize,
) -> Result<JsonValue> {
    let contact_id = ctx.params.required_str("contactId", item)?;
    let entries = ctx.params.array_or_empty("additionalData.data", item);
    let body = json!({
        "contact_id": contact_id,
        "additional_data": additional_data(&entries),
    });
    post(client, "/business_workflows/additional-data", body).await
}

/// Fold `[{key, value}]` entries into one object, dropping blank keys
pub(crate) fn additional_data(entries: &[JsonValue]) -> JsonObject {
    let mut data = JsonObject::new();
    for entry in entries {
        let key = entry.get("key").map(value_to_string).unwrap_or_default();
        if key.is_empty() {
            continue;
        }
        let value = entry.get("value").cloned().unwrap_or(JsonValue::Null);
        data.insert(key, value);
    }
    data
}

async fn webhook_subscription(
    client: &CekatClient,
    ctx: &ExecutionContext<'_>,
    item: usize,
    action: &str,
) -> Result<JsonValue> {
    let body = json!({
        "webhookUrl": ctx.params.required_str("webhookUrl", item)?,
        "inboxId": ctx.params.required_str("inboxId", item)?,
        "events": ctx.params.array_or_empty("events", item),
    });
    post(client, &format!("/business_workflows/webhooks/{action}"), body).await
}
