//! TOML file configuration structures.
//!
//! These structs directly map to the `shopfront.toml` file format.

use serde::{Deserialize, Serialize};
use shopfront_core::config::{BackoffPolicy, DEFAULT_RECENT_CAPACITY};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root URL of the storefront backend (e.g., "https://shop.example.com").
    pub base_url: Url,
    /// Timeout for REST calls. The notification stream is exempt.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

/// Where the bearer token comes from. An inline `token` wins over the
/// environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_token_env() -> String {
    "SHOPFRONT_TOKEN".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env: default_token_env(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Sse,
    Ws,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub transport: Transport,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_cap_delay_ms")]
    pub cap_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,
}

fn default_base_delay_ms() -> u64 {
    BackoffPolicy::DEFAULT_BASE_DELAY.as_millis() as u64
}

fn default_cap_delay_ms() -> u64 {
    BackoffPolicy::DEFAULT_CAP_DELAY.as_millis() as u64
}

fn default_max_attempts() -> u32 {
    BackoffPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_recent_capacity() -> usize {
    DEFAULT_RECENT_CAPACITY
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            base_delay_ms: default_base_delay_ms(),
            cap_delay_ms: default_cap_delay_ms(),
            max_attempts: default_max_attempts(),
            recent_capacity: default_recent_capacity(),
        }
    }
}
