//! Webhook receiver for trigger nodes
//!
//! Each POST to `/webhook` is shaped by the selected trigger and the
//! resulting workflow items are printed to stdout as JSON lines. With
//! `register` set, the webhook is registered upstream on start and removed
//! again on shutdown.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::CredentialProvider;
use crate::config::Config;
use crate::dispatch::ExecutionContext;
use crate::error::{Error, Result};
use crate::params::ItemParameters;
use crate::registry;
use crate::trigger::{self, WebhookContext, WebhookTrigger, WorkflowInfo};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Trigger type name
    pub trigger: String,
    /// Public URL registered upstream; defaults to the local `/webhook` route
    pub webhook_url: Option<String>,
    /// Register on start and unregister on shutdown
    pub register: bool,
    /// Trigger parameters read during registration
    pub params: ItemParameters,
}

/// App state shared across handlers
struct AppState {
    trigger: Box<dyn WebhookTrigger>,
    hook: WebhookContext,
}

/// Build the receiver routes for one trigger
pub fn router(trigger: Box<dyn WebhookTrigger>, hook: WebhookContext) -> Router {
    let state = AppState { trigger, hook };
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(receive))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the webhook receiver
pub async fn serve<C>(server: ServerConfig, config: Config, credentials: C) -> Result<()>
where
    C: CredentialProvider,
{
    let trigger = registry::trigger(&server.trigger)?;
    let webhook_url = server
        .webhook_url
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}/webhook", server.port));
    let hook = WebhookContext::new(webhook_url).with_workflow(WorkflowInfo {
        id: "cli".to_string(),
        name: format!("{} receiver", server.trigger),
        active: true,
    });

    let ctx = ExecutionContext::new(&server.params, &credentials, &config);
    if server.register {
        let created = trigger::activate(trigger.as_ref(), &ctx, &hook).await?;
        tracing::info!(trigger = %server.trigger, created, "Webhook registration checked");
    }

    let app = router(registry::trigger(&server.trigger)?, hook.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
    tracing::info!("Receiving {} webhooks on http://{}", server.trigger, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {}: {e}", server.port)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    if server.register {
        trigger.delete(&ctx, &hook).await?;
        tracing::info!(trigger = %server.trigger, "Webhook removed");
    }
    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Shape one inbound payload into workflow items
async fn receive(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> impl IntoResponse {
    let records = state.trigger.webhook(body, &state.hook);
    for record in &records {
        println!("{}", serde_json::to_string(record).unwrap_or_default());
    }
    tracing::debug!(trigger = state.trigger.name(), items = records.len(), "Webhook received");

    (StatusCode::OK, Json(json!({ "received": records.len() })))
}
