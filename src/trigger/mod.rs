//! Webhook trigger lifecycle
//!
//! A trigger registers a callback URL with an upstream API when a workflow
//! is activated, removes it on deactivation, and turns each inbound POST
//! into workflow items.
//!
//! ```text
//! activate:   check_exists ──false──► create
//! deactivate: delete
//! inbound:    webhook(body) ──► [OutputRecord]
//! ```

use crate::dispatch::ExecutionContext;
use crate::error::Result;
use crate::types::{JsonValue, OutputRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Workflow that owns a trigger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInfo {
    pub id: String,
    pub name: String,
    pub active: bool,
}

/// What a trigger knows about its own registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookContext {
    /// Public URL the upstream API should POST to
    pub webhook_url: String,
    #[serde(default)]
    pub workflow: WorkflowInfo,
}

impl WebhookContext {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            workflow: WorkflowInfo::default(),
        }
    }

    #[must_use]
    pub fn with_workflow(mut self, workflow: WorkflowInfo) -> Self {
        self.workflow = workflow;
        self
    }
}

/// Registration hooks plus inbound payload shaping
#[async_trait]
pub trait WebhookTrigger: Send + Sync {
    /// Trigger node type name
    fn name(&self) -> &'static str;

    /// Whether the upstream already holds a registration
    async fn check_exists(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool>;

    /// Register the webhook
    async fn create(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool>;

    /// Remove the webhook
    async fn delete(&self, ctx: &ExecutionContext<'_>, hook: &WebhookContext) -> Result<bool>;

    /// Items produced by one inbound request; the body is forwarded verbatim
    fn webhook(&self, body: JsonValue, _hook: &WebhookContext) -> Vec<OutputRecord> {
        vec![OutputRecord::new(body)]
    }
}

/// Register unless a registration already exists
///
/// Returns `true` when a new registration was created.
pub async fn activate(
    trigger: &dyn WebhookTrigger,
    ctx: &ExecutionContext<'_>,
    hook: &WebhookContext,
) -> Result<bool> {
    if trigger.check_exists(ctx, hook).await? {
        tracing::debug!(trigger = trigger.name(), "Webhook already registered");
        return Ok(false);
    }
    tracing::info!(trigger = trigger.name(), url = %hook.webhook_url, "Registering webhook");
    trigger.create(ctx, hook).await
}
