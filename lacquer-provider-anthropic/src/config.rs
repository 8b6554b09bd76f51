//! Configuration for the Anthropic provider.

use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
const DEFAULT_USER_AGENT: &str = concat!("lacquer-provider-anthropic/", env!("CARGO_PKG_VERSION"));

/// The shortest an Anthropic key can legitimately be. Guards against the
/// bare prefix (`"sk-ant-"`, 7 characters) passing format validation.
const MIN_API_KEY_LEN: usize = 20;

/// Environment variables checked, in order, for an Anthropic API key.
pub const API_KEY_ENV_VARS: &[&str] = &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY", "ANTHROPIC_KEY"];

/// Static configuration for an [`crate::AnthropicProvider`].
///
/// `api_key` is never read from this struct's `Default` — it falls back to
/// [`API_KEY_ENV_VARS`] at construction time, and a key that doesn't look
/// like `sk-ant-...` is rejected up front rather than sent to the vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API base URL, overridable for testing or a proxy.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// `anthropic-version` header value.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Model used when a request doesn't name one explicitly.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Default `max_tokens` when a request doesn't set one.
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,
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

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            default_model: default_model(),
            default_max_tokens: default_max_tokens(),
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

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
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

/// Validate an API key's shape without making a network call: Anthropic
/// keys are always prefixed `sk-ant-` and are never this short on their
/// own — the bare prefix must not pass.
pub fn validate_api_key_format(key: &str) -> Result<(), String> {
    if key.starts_with("sk-ant-") && key.len() >= MIN_API_KEY_LEN {
        Ok(())
    } else {
        Err(format!(
            "ANTHROPIC_API_KEY does not look like an Anthropic key (expected sk-ant- prefix and at least {MIN_API_KEY_LEN} characters)"
        ))
    }
}

/// Read an Anthropic API key from [`API_KEY_ENV_VARS`], trying each in
/// order and returning the first one that's set.
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS.iter().find_map(|var| std::env::var(var).ok())
}
