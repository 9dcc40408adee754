use crate::auth::{AuthConfig, CredentialProvider};
use crate::config::Config;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig};
use crate::params::ParameterSource;

/// Everything a handler may read while processing one execution
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub params: &'a dyn ParameterSource,
    pub credentials: &'a dyn CredentialProvider,
    pub config: &'a Config,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        params: &'a dyn ParameterSource,
        credentials: &'a dyn CredentialProvider,
        config: &'a Config,
    ) -> Self {
        Self {
            params,
            credentials,
            config,
        }
    }

    /// Build an HTTP client for one base URL using the configured timeout
    pub fn http_client(&self, base_url: &str, auth: AuthConfig) -> Result<HttpClient> {
        let mut builder = HttpClientConfig::builder()
            .base_url(base_url)
            .timeout(self.config.http.timeout());
        if let Some(agent) = &self.config.http.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        HttpClient::with_auth(builder.build(), auth)
    }
}

impl std::fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("items", &self.params.item_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
