//! Configuration module for the shopfront client.
//!
//! Loads the TOML file, applies CLI overrides, validates, and resolves the
//! bearer token from the file or the environment.

pub mod file;

use crate::config::file::{AuthConfig, FileConfig, Transport};
use shopfront_core::config::{BackoffPolicy, NotificationConfig};
use shopfront_sdk::auth::BearerToken;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub token: Option<BearerToken>,
    pub transport: Transport,
    pub notifications: NotificationConfig,
}

pub struct ConfigLoader {
    config_path: PathBuf,
    base_url_override: Option<Url>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, base_url_override: Option<Url>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            base_url_override,
        }
    }

    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(base_url) = &self.base_url_override {
            file_config.api.base_url = base_url.clone();
        }

        validate(&file_config)?;

        let token = resolve_token(&file_config.auth, |name| std::env::var(name).ok());
        if token.is_none() {
            tracing::warn!(
                token_env = %file_config.auth.token_env,
                "No auth token configured, requests will be rejected"
            );
        }

        Ok(build_loaded_config(file_config, token))
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let scheme = config.api.base_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::ValidationError(format!(
            "api.base_url must be http or https, got {scheme}"
        )));
    }
    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "api.timeout_secs must be positive".to_string(),
        ));
    }

    let n = &config.notifications;
    if n.base_delay_ms == 0 {
        return Err(ConfigError::ValidationError(
            "notifications.base_delay_ms must be positive".to_string(),
        ));
    }
    if n.cap_delay_ms < n.base_delay_ms {
        return Err(ConfigError::ValidationError(format!(
            "notifications.cap_delay_ms ({}) is below base_delay_ms ({})",
            n.cap_delay_ms, n.base_delay_ms
        )));
    }
    if n.recent_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "notifications.recent_capacity must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Inline token first, then the named environment variable. Blank values
/// count as absent.
fn resolve_token(auth: &AuthConfig, env: impl Fn(&str) -> Option<String>) -> Option<BearerToken> {
    auth.token
        .clone()
        .or_else(|| env(&auth.token_env))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .map(BearerToken::new)
}

fn build_loaded_config(file_config: FileConfig, token: Option<BearerToken>) -> LoadedConfig {
    let n = file_config.notifications;
    LoadedConfig {
        base_url: file_config.api.base_url,
        timeout: Duration::from_secs(file_config.api.timeout_secs),
        token,
        transport: n.transport,
        notifications: NotificationConfig {
            backoff: BackoffPolicy::new(
                Duration::from_millis(n.base_delay_ms),
                Duration::from_millis(n.cap_delay_ms),
                n.max_attempts,
            ),
            recent_capacity: n.recent_capacity,
        },
    }
}
