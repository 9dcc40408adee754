//! Stored credentials and the provider seam nodes read them through

use super::types::{AuthConfig, CEKAT_API_KEY_HEADER};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Credential used by every Cekat node
pub const CEKAT_CREDENTIAL: &str = "CekatOpenApi";
/// Power BI bearer-token credential
pub const POWERBI_CREDENTIAL: &str = "powerBiApi";
/// Power BI OAuth2 credential
pub const POWERBI_OAUTH2_CREDENTIAL: &str = "powerBiApiOAuth2Api";
/// WhatsApp Business Cloud credential
pub const WHATSAPP_CREDENTIAL: &str = "whatsAppApi";

/// A stored credential, tagged by `type`
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    ApiKey {
        #[serde(alias = "apiKey")]
        api_key: String,
    },
    Bearer {
        #[serde(alias = "bearerToken", alias = "accessToken")]
        token: String,
    },
    Oauth2Refresh {
        #[serde(alias = "accessTokenUrl")]
        token_url: String,
        #[serde(alias = "clientId")]
        client_id: String,
        #[serde(alias = "clientSecret")]
        client_secret: String,
        #[serde(alias = "refreshToken")]
        refresh_token: String,
    },
    Oauth2ClientCredentials {
        #[serde(alias = "accessTokenUrl")]
        token_url: String,
        #[serde(alias = "clientId")]
        client_id: String,
        #[serde(alias = "clientSecret")]
        client_secret: String,
        #[serde(default)]
        scopes: Vec<String>,
    },
}

impl Credential {
    /// The raw key or token, when the credential holds one directly
    pub fn secret(&self) -> Option<&str> {
        match self {
            Credential::ApiKey { api_key } => Some(api_key),
            Credential::Bearer { token } => Some(token),
            _ => None,
        }
    }

    /// Auth config for APIs that take the key in the `api_key` header
    pub fn api_key_auth(&self) -> Result<AuthConfig> {
        match self.secret() {
            Some(value) => Ok(AuthConfig::ApiKey {
                header_name: CEKAT_API_KEY_HEADER.to_string(),
                value: value.to_string(),
            }),
            None => Err(Error::auth("API key credential required")),
        }
    }

    /// Auth config for APIs that take `Authorization: Bearer <token>`
    pub fn bearer_auth(&self) -> AuthConfig {
        match self.clone() {
            Credential::ApiKey { api_key: token } | Credential::Bearer { token } => {
                AuthConfig::Bearer { token }
            }
            Credential::Oauth2Refresh {
                token_url,
                client_id,
                client_secret,
                refresh_token,
            } => AuthConfig::Oauth2Refresh {
                token_url,
                client_id,
                client_secret,
                refresh_token,
            },
            Credential::Oauth2ClientCredentials {
                token_url,
                client_id,
                client_secret,
                scopes,
            } => AuthConfig::Oauth2ClientCredentials {
                token_url,
                client_id,
                client_secret,
                scopes,
            },
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Credential::ApiKey { .. } => "ApiKey",
            Credential::Bearer { .. } => "Bearer",
            Credential::Oauth2Refresh { .. } => "Oauth2Refresh",
            Credential::Oauth2ClientCredentials { .. } => "Oauth2ClientCredentials",
        };
        write!(f, "Credential::{kind}(<redacted>)")
    }
}

/// Source of credentials by name
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Look up a credential, failing with `MissingCredential` when absent
    async fn credential(&self, name: &str) -> Result<Credential>;
}

/// In-memory credentials, optionally loaded from a JSON file
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    entries: HashMap<String, Credential>,
}

impl StaticCredentials {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential under a name
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, credential: Credential) -> Self {
        self.entries.insert(name.into(), credential);
        self
    }

    /// Load `{ "<name>": { "type": ..., ... } }` from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let entries: HashMap<String, Credential> = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }

    /// Names of the stored credentials
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credential(&self, name: &str) -> Result<Credential> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::missing_credential(name))
    }
}

/// Credentials read from environment variables
///
/// `CEKAT_API_KEY` backs `CekatOpenApi`, `POWERBI_BEARER_TOKEN` backs
/// `powerBiApi` and `WHATSAPP_ACCESS_TOKEN` backs `whatsAppApi`.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    vars: HashMap<String, String>,
}

impl EnvCredentials {
    /// Snapshot the relevant variables from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, v)| Self::variable_for_key(k) && !v.is_empty())
            .collect();
        Self { vars }
    }

    fn variable_for_key(key: &str) -> bool {
        matches!(
            key,
            "CEKAT_API_KEY" | "POWERBI_BEARER_TOKEN" | "WHATSAPP_ACCESS_TOKEN"
        )
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn credential(&self, name: &str) -> Result<Credential> {
        let found = match name {
            CEKAT_CREDENTIAL => self
                .vars
                .get("CEKAT_API_KEY")
                .map(|v| Credential::ApiKey { api_key: v.clone() }),
            POWERBI_CREDENTIAL | POWERBI_OAUTH2_CREDENTIAL => self
                .vars
                .get("POWERBI_BEARER_TOKEN")
                .map(|v| Credential::Bearer { token: v.clone() }),
            WHATSAPP_CREDENTIAL => self
                .vars
                .get("WHATSAPP_ACCESS_TOKEN")
                .map(|v| Credential::Bearer { token: v.clone() }),
            _ => None,
        };
        found.ok_or_else(|| Error::missing_credential(name))
    }
}

/// Tries each provider in order and returns the first hit
#[derive(Default)]
pub struct ChainedCredentials {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ChainedCredentials {
    /// Empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider
    #[must_use]
    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

#[async_trait]
impl CredentialProvider for ChainedCredentials {
    async fn credential(&self, name: &str) -> Result<Credential> {
        for provider in &self.providers {
            match provider.credential(name).await {
                Ok(credential) => return Ok(credential),
                Err(Error::MissingCredential { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Error::missing_credential(name))
    }
}
