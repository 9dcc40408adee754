//! Cekat request helper
//!
//! Every Cekat node authenticates with the `CekatOpenApi` key sent in the
//! `api_key` header. Handlers pick one of three hosts per call.

use crate::auth::CEKAT_CREDENTIAL;
use crate::config::CekatBaseUrls;
use crate::dispatch::ExecutionContext;
use crate::error::{Error, Result};
use crate::http::{join_url, ApiRequest, HttpClient};
use crate::types::JsonValue;
use std::fmt;

/// Which Cekat host a call goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlVariant {
    Server,
    Api,
    Staging,
}

impl UrlVariant {
    /// Configured base URL for this variant
    pub fn base_url(self, urls: &CekatBaseUrls) -> &str {
        match self {
            UrlVariant::Server => &urls.server,
            UrlVariant::Api => &urls.api,
            UrlVariant::Staging => &urls.staging,
        }
    }
}

/// Authenticated client for the Cekat hosts
pub struct CekatClient {
    http: HttpClient,
    urls: CekatBaseUrls,
    api_key: String,
}

impl CekatClient {
    /// Resolve the Cekat credential and build a client
    pub async fn from_context(ctx: &ExecutionContext<'_>) -> Result<Self> {
        let credential = ctx.credentials.credential(CEKAT_CREDENTIAL).await?;
        let api_key = credential
            .secret()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::auth("No Cekat API Key credentials found"))?
            .to_string();
        let urls = ctx.config.cekat.base_urls.clone();
        let http = ctx.http_client(&urls.server, credential.api_key_auth()?)?;
        Ok(Self { http, urls, api_key })
    }

    /// The raw API key, for endpoints that also want it as a bearer token
    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Send a request to the given host and return the parsed body
    pub async fn call(&self, variant: UrlVariant, mut request: ApiRequest) -> Result<JsonValue> {
        request.path = join_url(variant.base_url(&self.urls), &request.path);
        self.http.call(request).await
    }
}

impl fmt::Debug for CekatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CekatClient")
            .field("urls", &self.urls)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}
