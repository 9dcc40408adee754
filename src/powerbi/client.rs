//! Power BI request helper
//!
//! Wraps [`HttpClient`] with the conventions every Power BI call shares:
//! empty bodies are not sent, structured error bodies are turned into
//! [`Error::Upstream`], and list endpoints can be followed through
//! `nextLink` pages.

use crate::auth::{POWERBI_CREDENTIAL, POWERBI_OAUTH2_CREDENTIAL};
use crate::dispatch::ExecutionContext;
use crate::error::{Error, Result};
use crate::http::{ApiRequest, HttpClient};
use crate::params::ParameterSourceExt;
use crate::types::JsonValue;
use bytes::Bytes;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Page size requested by [`PowerBiClient::request_all`]
const PAGE_SIZE: &str = "100";

static SKIP_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$skiptoken=([^&]+)").ok());

/// Credential name selected by the node's `authentication` parameter
///
/// `apiKey` means a plain bearer token; anything else is OAuth2.
pub fn credential_name(authentication: &str) -> &'static str {
    if authentication == "apiKey" {
        POWERBI_CREDENTIAL
    } else {
        POWERBI_OAUTH2_CREDENTIAL
    }
}

/// Path scoped to a workspace
///
/// An empty group or `me` addresses the caller's own workspace.
pub fn group_path(group_id: &str, suffix: &str) -> String {
    if group_id.is_empty() || group_id == "me" {
        suffix.to_string()
    } else {
        format!("/groups/{group_id}{suffix}")
    }
}

/// Authenticated client for the Power BI REST API
#[derive(Debug)]
pub struct PowerBiClient {
    http: HttpClient,
}

impl PowerBiClient {
    /// Resolve the credential chosen by `authentication` and build a client
    pub async fn from_context(ctx: &ExecutionContext<'_>) -> Result<Self> {
        let authentication = ctx.params.str_or("authentication", 0, "oAuth2");
        let credential = ctx
            .credentials
            .credential(credential_name(&authentication))
            .await?;
        let http = ctx.http_client(&ctx.config.powerbi.base_url, credential.bearer_auth())?;
        Ok(Self { http })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        self.http.base_url().unwrap_or_default()
    }

    /// Send one request and return its JSON body
    pub async fn request(&self, mut request: ApiRequest) -> Result<JsonValue> {
        if request.body.as_ref().is_some_and(is_empty_body) {
            request.body = None;
        }
        self.http.call(request).await.map_err(enhance_error)
    }

    /// Download a file body, keeping the response content type
    pub async fn download(&self, path: &str) -> Result<(Bytes, Option<String>)> {
        self.http
            .call_binary(ApiRequest::get(path))
            .await
            .map_err(enhance_error)
    }

    /// Collect `property` across every page of a list endpoint
    pub async fn request_all(&self, path: &str, property: &str) -> Result<Vec<JsonValue>> {
        let mut collected = Vec::new();
        let mut skip_token: Option<String> = None;

        loop {
            let mut request = ApiRequest::get(path).query("top", PAGE_SIZE);
            if let Some(token) = &skip_token {
                request = request.query("skiptoken", token.as_str());
            }
            let page = self.request(request).await?;
            if let Some(values) = page.get(property).and_then(JsonValue::as_array) {
                collected.extend(values.iter().cloned());
            }

            let next = page
                .get("nextLink")
                .and_then(JsonValue::as_str)
                .and_then(extract_skip_token);
            match next {
                // A link without a new token would request the same page again
                Some(token) if skip_token.as_deref() != Some(token.as_str()) => {
                    debug!(path, fetched = collected.len(), "Following nextLink");
                    skip_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(collected)
    }
}

fn is_empty_body(body: &JsonValue) -> bool {
    match body {
        JsonValue::Null => true,
        JsonValue::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// The `$skiptoken` value of a `nextLink` URL
pub fn extract_skip_token(next_link: &str) -> Option<String> {
    SKIP_TOKEN
        .as_ref()?
        .captures(next_link)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Turn a structured Power BI error body into [`Error::Upstream`]
///
/// Bodies of the form `{"error": {"code", "message", "details"}}` become
/// `"<message> [<code>]: <details>"`; anything else is returned unchanged.
pub fn enhance_error(error: Error) -> Error {
    let Error::HttpStatus { status, body } = error else {
        return error;
    };
    let detail = serde_json::from_str::<JsonValue>(&body)
        .ok()
        .and_then(|parsed| parsed.get("error").filter(|e| e.is_object()).cloned());
    match detail {
        Some(detail) => Error::Upstream {
            status,
            code: text_field(&detail, "code"),
            message: text_field(&detail, "message"),
            details: detail.get("details").map(JsonValue::to_string),
        },
        None => Error::HttpStatus { status, body },
    }
}

fn text_field(value: &JsonValue, key: &str) -> String {
    value
        .get(key)
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string()
}
