use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::utils::retry::RetryPolicy;

/// Runtime configuration, layered from defaults, `Settings.toml` and `DECKWORKS_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_server: String,
    pub auth_server: String,
    pub request_timeout_secs: u64,
    pub read_retry_attempts: u32,
    pub read_retry_backoff_ms: u64,
    pub success_notice_secs: u64,
    pub error_notice_secs: u64,
    pub log_level: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_server: "http://localhost:8080".to_string(),
            auth_server: "http://localhost:8080".to_string(),
            request_timeout_secs: 20,
            read_retry_attempts: 3,
            read_retry_backoff_ms: 500,
            success_notice_secs: 3,
            error_notice_secs: 10,
            log_level: "INFO".to_string(),
            access_token: None,
            refresh_token: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Settings::load_from("Settings")
    }

    /// Loads settings using `file` (without extension) as the optional file source.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        Config::builder()
            .set_default("api_server", defaults.api_server)?
            .set_default("auth_server", defaults.auth_server)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("read_retry_attempts", defaults.read_retry_attempts as i64)?
            .set_default("read_retry_backoff_ms", defaults.read_retry_backoff_ms as i64)?
            .set_default("success_notice_secs", defaults.success_notice_secs as i64)?
            .set_default("error_notice_secs", defaults.error_notice_secs as i64)?
            .set_default("log_level", defaults.log_level)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("DECKWORKS").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.read_retry_attempts,
            backoff: Duration::from_millis(self.read_retry_backoff_ms),
        }
    }

    pub fn success_notice_ttl(&self) -> Duration {
        Duration::from_secs(self.success_notice_secs)
    }

    pub fn error_notice_ttl(&self) -> Duration {
        Duration::from_secs(self.error_notice_secs)
    }
}
