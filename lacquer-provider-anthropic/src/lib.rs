#![deny(missing_docs)]
//! # lacquer-provider-anthropic
//!
//! Implements [`lacquer_provider::ModelProvider`] for Anthropic's Messages
//! API.

mod config;
mod error;
mod mapping;
mod types;

pub use config::{api_key_from_env, validate_api_key_format, AnthropicConfig};

use async_trait::async_trait;
use error::{map_http_status, map_reqwest_error, retry_after_from_header};
use lacquer_context::ExecutionContext;
use lacquer_core::{ModelRequest, ProgressSink};
use lacquer_provider::{with_retry, ModelInfo, ModelProvider, ModelResponse, ProviderError, RetryPolicy};
use mapping::{from_api_response, to_api_request};
use std::time::Duration;
use types::AnthropicModelList;

/// Name this provider registers under (`Agent::provider` in a workflow).
pub const PROVIDER_NAME: &str = "anthropic";

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    api_key: String,
    client: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl AnthropicProvider {
    /// Build a provider from an explicit API key and config.
    pub fn new(api_key: impl Into<String>, config: AnthropicConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .expect("anthropic http client configuration is always valid");
        let retry_policy = RetryPolicy {
            max_attempts: config.max_retries + 1,
            base_delay: Duration::from_millis(config.retry_delay_ms),
            ..RetryPolicy::default()
        };
        Self { config, api_key: api_key.into(), client, retry_policy }
    }

    /// Build a provider from [`api_key_from_env`] (`ANTHROPIC_API_KEY`,
    /// falling back to `CLAUDE_API_KEY` then `ANTHROPIC_KEY`).
    pub fn from_env(config: AnthropicConfig) -> Result<Self, ProviderError> {
        let key = api_key_from_env()
            .ok_or_else(|| ProviderError::AuthFailed("no Anthropic API key found in the environment".to_string()))?;
        validate_api_key_format(&key).map_err(ProviderError::AuthFailed)?;
        Ok(Self::new(key, config))
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.config.base_url)
    }

    async fn send_once(&self, request: &ModelRequest, ctx: &ExecutionContext) -> Result<ModelResponse, ProviderError> {
        let body = to_api_request(request, &self.config.default_model, self.config.default_max_tokens);
        let response = tokio::select! {
            result = self
                .client
                .post(self.messages_url())
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", &self.config.api_version)
                .json(&body)
                .send() => result.map_err(map_reqwest_error)?,
            _ = ctx.cancelled() => return Err(ProviderError::RequestFailed("cancelled".to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_from_header(&response);
            let text = response.text().await.unwrap_or_default();
            return Err(match (status.as_u16(), retry_after) {
                (429, Some(delay)) => ProviderError::RateLimited(Some(delay)),
                _ => map_http_status(status, &text),
            });
        }

        let api_response = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(from_api_response(api_response))
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    async fn generate(
        &self,
        request: &ModelRequest,
        ctx: &ExecutionContext,
        step_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ModelResponse, ProviderError> {
        let (result, retries) =
            with_retry(self.retry_policy, ctx, step_id, sink, || self.send_once(request, ctx)).await;
        if retries > 0 {
            tracing::debug!(retries, "anthropic request succeeded after retrying");
        }
        result
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let response = self
            .client
            .get(self.models_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.api_version)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_http_status(status, &text));
        }
        let list: AnthropicModelList = response.json().await.map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(list
            .data
            .into_iter()
            .map(|m| ModelInfo { id: m.id, display_name: m.display_name, context_window: None })
            .collect())
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_rejects_a_malformed_key() {
        // SAFETY: test-only, single-threaded std::env mutation scoped to this test.
        unsafe { std::env::set_var("ANTHROPIC_API_KEY", "not-an-anthropic-key") };
        let result = AnthropicProvider::from_env(AnthropicConfig::default());
        unsafe { std::env::remove_var("ANTHROPIC_API_KEY") };
        assert!(result.is_err());
    }

    #[test]
    fn provider_name_matches_the_agent_provider_field_convention() {
        let provider = AnthropicProvider::new("sk-ant-test", AnthropicConfig::default());
        assert_eq!(provider.name(), "anthropic");
    }
}
