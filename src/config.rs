//! Runtime configuration
//!
//! Base URLs, timeouts and export polling defaults. Loaded from a YAML or
//! JSON file (chosen by extension). Every field has a default, so a file
//! only needs the values it overrides.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cekat API hosts
    #[serde(default)]
    pub cekat: CekatConfig,

    /// Power BI REST API
    #[serde(default)]
    pub powerbi: PowerBiConfig,

    /// WhatsApp Business Cloud API
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Report export polling
    #[serde(default)]
    pub export: ExportConfig,

    /// Item loop behaviour
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl Config {
    /// Load from a `.yaml`/`.yml` or `.json` file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        })?;

        let config: Config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            other => {
                return Err(Error::config(format!(
                    "Unsupported config file extension: {}",
                    other.unwrap_or("<none>")
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every base URL parses and the polling values are usable
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("cekat.base_urls.server", &self.cekat.base_urls.server),
            ("cekat.base_urls.api", &self.cekat.base_urls.api),
            ("cekat.base_urls.staging", &self.cekat.base_urls.staging),
            ("powerbi.base_url", &self.powerbi.base_url),
            ("whatsapp.base_url", &self.whatsapp.base_url),
        ];
        for (name, value) in urls {
            url::Url::parse(value)
                .map_err(|e| Error::config(format!("{name} is not a valid URL: {e}")))?;
        }

        if self.export.max_wait_secs == 0 {
            return Err(Error::config("export.max_wait_secs must be greater than 0"));
        }
        Ok(())
    }
}

// ============================================================================
// Upstream APIs
// ============================================================================

/// Cekat hosts, one per URL variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CekatConfig {
    #[serde(default)]
    pub base_urls: CekatBaseUrls,
}

/// The three Cekat hosts handlers choose between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CekatBaseUrls {
    #[serde(default = "default_cekat_url")]
    pub server: String,
    #[serde(default = "default_cekat_url")]
    pub api: String,
    #[serde(default = "default_cekat_url")]
    pub staging: String,
}

impl Default for CekatBaseUrls {
    fn default() -> Self {
        Self {
            server: default_cekat_url(),
            api: default_cekat_url(),
            staging: default_cekat_url(),
        }
    }
}

fn default_cekat_url() -> String {
    "https://api.cekat.ai".to_string()
}

/// Power BI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerBiConfig {
    #[serde(default = "default_powerbi_url")]
    pub base_url: String,
}

impl Default for PowerBiConfig {
    fn default() -> Self {
        Self {
            base_url: default_powerbi_url(),
        }
    }
}

fn default_powerbi_url() -> String {
    "https://api.powerbi.com/v1.0/myorg".to_string()
}

/// WhatsApp settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "default_whatsapp_url")]
    pub base_url: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            base_url: default_whatsapp_url(),
        }
    }
}

fn default_whatsapp_url() -> String {
    "https://graph.facebook.com/v13.0/".to_string()
}

// ============================================================================
// HTTP, Export, Execution
// ============================================================================

/// HTTP client settings shared by every node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout() -> u64 {
    30
}

/// Defaults for report export polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Seconds between status polls
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,

    /// Give up after this many seconds of polling
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            polling_interval_secs: default_polling_interval(),
            max_wait_secs: default_max_wait(),
        }
    }
}

fn default_polling_interval() -> u64 {
    20
}

fn default_max_wait() -> u64 {
    600
}

/// Item loop behaviour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Capture failures as error records instead of aborting
    #[serde(default)]
    pub continue_on_fail: bool,
}
