//! HTTP Request Adapter
//!
//! Builds one request from an [`ApiRequest`] descriptor, applies the
//! configured credential and returns the parsed JSON body (or raw bytes in
//! binary mode). Non-2xx responses become `Error::HttpStatus` carrying the
//! upstream status and body. The adapter never retries.

use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method};
use bytes::Bytes;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for relative request paths
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("cekat-nodes/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Request descriptor: constructed per call and consumed by it
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl ApiRequest {
    /// Create a request for a method and path
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }
}

/// How the response body should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Json,
    Binary,
}

/// Response body in the requested mode
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(JsonValue),
    Binary {
        bytes: Bytes,
        content_type: Option<String>,
    },
}

/// HTTP client bound to one base URL and one credential
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            authenticator: None,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.authenticator = Some(Authenticator::with_client(
            auth_config,
            client.client.clone(),
        ));
        Ok(client)
    }

    /// Base URL this client resolves relative paths against
    pub fn base_url(&self) -> Option<&str> {
        self.config.base_url.as_deref()
    }

    /// Send a request and parse the JSON body
    pub async fn call(&self, request: ApiRequest) -> Result<JsonValue> {
        match self.fetch(request, ResponseMode::Json).await? {
            ApiResponse::Json(value) => Ok(value),
            ApiResponse::Binary { bytes, .. } => Ok(parse_body(&bytes)),
        }
    }

    /// Send a request and return the raw body with its content type
    pub async fn call_binary(&self, request: ApiRequest) -> Result<(Bytes, Option<String>)> {
        match self.fetch(request, ResponseMode::Binary).await? {
            ApiResponse::Binary {
                bytes,
                content_type,
            } => Ok((bytes, content_type)),
            ApiResponse::Json(value) => Ok((Bytes::from(value.to_string()), None)),
        }
    }

    /// Send a request and read the body in the given mode
    pub async fn fetch(&self, request: ApiRequest, mode: ResponseMode) -> Result<ApiResponse> {
        let response = self.send(request).await?;
        match mode {
            ResponseMode::Json => {
                let bytes = response.bytes().await?;
                Ok(ApiResponse::Json(parse_body(&bytes)))
            }
            ResponseMode::Binary => {
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                let bytes = response.bytes().await?;
                Ok(ApiResponse::Binary {
                    bytes,
                    content_type,
                })
            }
        }
    }

    /// Send a request, mapping non-2xx statuses to `Error::HttpStatus`
    pub async fn send(&self, request: ApiRequest) -> Result<Response> {
        let full_url = self.build_url(&request.path);
        let method: reqwest::Method = request.method.into();

        let mut req = self.client.request(method, &full_url);

        if let Some(ref auth) = self.authenticator {
            req = auth.apply(req).await?;
        }

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        debug!(method = %request.method, url = %full_url, "Sending request");

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), url = %full_url, "Request succeeded");
        Ok(response)
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        match &self.config.base_url {
            Some(base) => join_url(base, path),
            None => path.to_string(),
        }
    }
}

/// Join a base URL and a path with exactly one `/`; absolute URLs win
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_authenticator", &self.authenticator.is_some())
            .finish_non_exhaustive()
    }
}

/// Parse a response body: empty is null, non-JSON text is kept as a string
fn parse_body(bytes: &[u8]) -> JsonValue {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return JsonValue::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(bytes).into_owned()))
}
