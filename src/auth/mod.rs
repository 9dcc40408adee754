//! Authentication module
//!
//! Supports: API key header (Cekat), Bearer (Power BI, WhatsApp), OAuth2
//!
//! Nodes read a [`Credential`] by name through a [`CredentialProvider`] and
//! turn it into an [`AuthConfig`] for their HTTP client. The `Authenticator`
//! applies that config and caches OAuth2 tokens.

mod authenticator;
mod credentials;
mod types;

pub use authenticator::Authenticator;
pub use credentials::{
    ChainedCredentials, Credential, CredentialProvider, EnvCredentials, StaticCredentials,
    CEKAT_CREDENTIAL, POWERBI_CREDENTIAL, POWERBI_OAUTH2_CREDENTIAL, WHATSAPP_CREDENTIAL,
};
pub use types::{AuthConfig, CachedToken, CEKAT_API_KEY_HEADER};
