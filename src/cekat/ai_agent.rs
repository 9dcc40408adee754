//! Cekat AI Agent node (`cekatAiAgent`)
//!
//! Sends a conversation to an AI agent and returns its reply. The node has
//! a single operation, so `resource` and `operation` default to
//! `message` and `send`.

use super::client::{CekatClient, UrlVariant};
use crate::dispatch::{operation_table, ExecutionContext, Node, OperationKey};
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use crate::params::{ParameterSource, ParameterSourceExt};
use crate::types::{JsonValue, OutputRecord};
use async_trait::async_trait;
use serde_json::json;

operation_table! {
    /// Operations of the Cekat AI Agent node
    pub enum AiAgentOperation {
        Send => ("message", "send"),
    }
}

/// The Cekat AI Agent node
#[derive(Debug, Clone, Copy, Default)]
pub struct CekatAiAgentNode;

#[async_trait]
impl Node for CekatAiAgentNode {
    fn name(&self) -> &'static str {
        "cekatAiAgent"
    }

    fn operations(&self) -> Vec<OperationKey> {
        AiAgentOperation::ALL.iter().map(|op| op.key()).collect()
    }

    async fn execute_item(&self, ctx: &ExecutionContext<'_>, item: usize) -> Result<OutputRecord> {
        let resource = ctx.params.str_or("resource", item, "message");
        let operation = ctx.params.str_or("operation", item, "send");
        let AiAgentOperation::Send = AiAgentOperation::parse(&resource, &operation)?;

        let body = json!({
            "ai_agent_id": ctx.params.required_str("ai_agent_id", item)?,
            "messages": parse_messages(ctx.params, item)?,
        });

        let client = CekatClient::from_context(ctx).await?;
        let response = client
            .call(UrlVariant::Api, ApiRequest::post("/api/ai_response/beta").json(body))
            .await?;
        Ok(OutputRecord::paired(response, item))
    }
}

/// Normalise the `messages` parameter into a list
///
/// Accepts a JSON string, an array, a `{messageItem: [...]}` collection or
/// a single message object.
pub fn parse_messages(params: &dyn ParameterSource, item: usize) -> Result<Vec<JsonValue>> {
    let value = match params.parameter("messages", item) {
        Some(JsonValue::String(raw)) => serde_json::from_str(&raw)
            .map_err(|e| Error::invalid_param("messages", format!("invalid JSON: {e}")))?,
        Some(value) => value,
        None => return Err(Error::missing_param("messages", item)),
    };

    Ok(match value {
        JsonValue::Array(messages) => messages,
        JsonValue::Object(ref map) if map.get("messageItem").is_some_and(JsonValue::is_array) => map
            .get("messageItem")
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default(),
        other => vec![other],
    })
}
