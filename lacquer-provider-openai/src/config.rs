//! Configuration for the OpenAI provider.

use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4.1";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
const DEFAULT_USER_AGENT: &str = concat!("lacquer-provider-openai/", env!("CARGO_PKG_VERSION"));

/// Environment variables checked, in order, for an OpenAI API key.
pub const API_KEY_ENV_VARS: &[&str] = &["OPENAI_API_KEY", "OPENAI_KEY", "OPENAI_TOKEN"];

/// Static configuration for a [`crate::OpenAiProvider`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL, overridable for Azure/proxy deployments.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used when a request doesn't name one explicitly.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Default `max_tokens` when a request doesn't set one.
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,
    /// Optional organization header.
    #[serde(default)]
    pub organization: Option<String>,
    /// HTTP client timeout, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum number of retries after a transient failure (not counting
    /// the first attempt).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff delay between retries, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            default_max_tokens: default_max_tokens(),
            organization: None,
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Validate an API key's shape without making a network call: OpenAI keys
/// are prefixed `sk-`.
pub fn validate_api_key_format(key: &str) -> Result<(), String> {
    if key.starts_with("sk-") {
        Ok(())
    } else {
        Err("OPENAI_API_KEY does not look like an OpenAI key (expected sk- prefix)".to_string())
    }
}

/// Read an OpenAI API key from [`API_KEY_ENV_VARS`], trying each in order
/// and returning the first one that's set.
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS.iter().find_map(|var| std::env::var(var).ok())
}
