//! # Sync Configuration
//!
//! Layered configuration for the sync: an optional YAML file, then `MCSYNC_*`
//! environment variables, then the conventional `DATABASE_URL` and
//! `MAILCHIMP_API_KEY` shortcuts.
//!
//! ```rust,no_run
//! use mailchimp_sync::config::SyncConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::load(None)?;
//! println!("batch size: {}", config.sync.batch_size);
//! # Ok(())
//! # }
//! ```

use crate::constants::{BATCH_COUNT, QUEUE_NAME};
use crate::error::{Result, SyncError};
use crate::orchestration::ErrorMode;
use config::{Config, Environment, File};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = "config/mailchimp-sync";
const MASK: &str = "********";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    pub database: DatabaseConfig,
    pub mailchimp: MailchimpConfig,
    pub sync: BatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/civicrm_development".to_string(),
            max_connections: 5,
        }
    }
}

/// Mailchimp API access and batch-subscribe options
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailchimpConfig {
    /// API key in the `<key>-<datacenter>` form
    pub api_key: Option<String>,
    /// Overrides the data-centre URL derived from the API key
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    pub double_optin: bool,
    pub update_existing: bool,
    pub replace_interests: bool,
}

impl Default for MailchimpConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_ms: 30000,
            double_optin: false,
            update_existing: true,
            replace_interests: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch_size: i64,
    pub queue_name: String,
    pub error_mode: ErrorMode,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_COUNT,
            queue_name: QUEUE_NAME.to_string(),
            error_mode: ErrorMode::Abort,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "log".to_string(),
            file_output: true,
        }
    }
}

impl SyncConfig {
    /// Load from `path` (or the default file if present) plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_sources(path, true)
    }

    pub fn from_sources(path: Option<&Path>, include_env: bool) -> Result<Self> {
        let mut builder = Config::builder();

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        if include_env {
            builder = builder.add_source(
                Environment::with_prefix("MCSYNC")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let mut config: SyncConfig = builder.build()?.try_deserialize()?;

        if include_env {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                config.database.url = url;
            }
            if let Ok(key) = std::env::var("MAILCHIMP_API_KEY") {
                config.mailchimp.api_key = Some(key);
            }
        }

        config.validate()?;
        debug!(config = %config.sanitized(), "Sync configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync.batch_size <= 0 {
            return Err(SyncError::InvalidBatchSize {
                batch_size: self.sync.batch_size,
            });
        }
        if self.sync.queue_name.trim().is_empty() {
            return Err(SyncError::configuration("sync.queue_name must not be empty"));
        }
        if self.database.url.trim().is_empty() {
            return Err(SyncError::configuration("database.url must not be empty"));
        }
        if let Some(key) = &self.mailchimp.api_key {
            if self.mailchimp.base_url.is_none() && data_center(key).is_none() {
                return Err(SyncError::configuration(
                    "mailchimp.api_key must end with a data centre suffix such as -us1",
                ));
            }
        }
        Ok(())
    }

    /// JSON view of the configuration with secrets masked
    pub fn sanitized(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(key) = value.pointer_mut("/mailchimp/api_key") {
            if !key.is_null() {
                *key = serde_json::Value::String(MASK.to_string());
            }
        }
        if let Some(url) = value.pointer_mut("/database/url") {
            *url = serde_json::Value::String(mask_url_password(&self.database.url));
        }
        value
    }
}

/// Data-centre suffix of a Mailchimp API key (`abc123-us6` -> `us6`)
pub fn data_center(api_key: &str) -> Option<&str> {
    api_key
        .rsplit_once('-')
        .map(|(_, dc)| dc)
        .filter(|dc| !dc.is_empty() && dc.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Replace the password of a connection URL; an unparseable URL is masked whole
fn mask_url_password(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return MASK.to_string();
    };
    if parsed.password().is_some() && parsed.set_password(Some(MASK)).is_err() {
        return MASK.to_string();
    }
    parsed.to_string()
}
