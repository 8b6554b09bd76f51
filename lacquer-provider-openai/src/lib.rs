#![deny(missing_docs)]
//! # lacquer-provider-openai
//!
//! Implements [`lacquer_provider::ModelProvider`] for OpenAI's Chat
//! Completions API.

mod config;
mod error;
mod mapping;
mod types;

pub use config::{api_key_from_env, validate_api_key_format, OpenAiConfig};

use async_trait::async_trait;
use error::{map_http_status, map_reqwest_error};
use lacquer_context::ExecutionContext;
use lacquer_core::{ModelRequest, ProgressSink};
use lacquer_provider::{with_retry, ModelInfo, ModelProvider, ModelResponse, ProviderError, RetryPolicy};
use mapping::{from_api_response, to_api_request};
use std::time::Duration;
use types::OpenAiModelList;

/// Name this provider registers under (`Agent::provider` in a workflow).
pub const PROVIDER_NAME: &str = "openai";

/// OpenAI Chat Completions API provider.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    api_key: String,
    client: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl OpenAiProvider {
    /// Build a provider from an explicit API key and config.
    pub fn new(api_key: impl Into<String>, config: OpenAiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .expect("openai http client configuration is always valid");
        let retry_policy = RetryPolicy {
            max_attempts: config.max_retries + 1,
            base_delay: Duration::from_millis(config.retry_delay_ms),
            ..RetryPolicy::default()
        };
        Self { config, api_key: api_key.into(), client, retry_policy }
    }

    /// Build a provider from [`api_key_from_env`] (`OPENAI_API_KEY`,
    /// falling back to `OPENAI_KEY` then `OPENAI_TOKEN`).
    pub fn from_env(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let key = api_key_from_env()
            .ok_or_else(|| ProviderError::AuthFailed("no OpenAI API key found in the environment".to_string()))?;
        validate_api_key_format(&key).map_err(ProviderError::AuthFailed)?;
        Ok(Self::new(key, config))
    }

    fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.config.base_url)
    }

    fn request_builder(&self, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.get(url).bearer_auth(&self.api_key);
        match &self.config.organization {
            Some(org) => builder.header("OpenAI-Organization", org),
            None => builder,
        }
    }

    async fn send_once(&self, request: &ModelRequest, ctx: &ExecutionContext) -> Result<ModelResponse, ProviderError> {
        let body = to_api_request(request, &self.config.default_model, self.config.default_max_tokens);
        let mut builder = self.client.post(self.chat_url()).bearer_auth(&self.api_key).json(&body);
        if let Some(org) = &self.config.organization {
            builder = builder.header("OpenAI-Organization", org);
        }
        let response = tokio::select! {
            result = builder.send() => result.map_err(map_reqwest_error)?,
            _ = ctx.cancelled() => return Err(ProviderError::RequestFailed("cancelled".to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_http_status(status, &text));
        }
        let api_response = response.json().await.map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        from_api_response(api_response).map_err(ProviderError::InvalidResponse)
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
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
            tracing::debug!(retries, "openai request succeeded after retrying");
        }
        result
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let response = self.request_builder(self.models_url()).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_http_status(status, &text));
        }
        let list: OpenAiModelList = response.json().await.map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(list.data.into_iter().map(|m| ModelInfo { display_name: m.id.clone(), id: m.id, context_window: None }).collect())
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
        unsafe { std::env::set_var("OPENAI_API_KEY", "not-an-openai-key") };
        let result = OpenAiProvider::from_env(OpenAiConfig::default());
        unsafe { std::env::remove_var("OPENAI_API_KEY") };
        assert!(result.is_err());
    }

    #[test]
    fn provider_name_matches_the_agent_provider_field_convention() {
        let provider = OpenAiProvider::new("sk-test", OpenAiConfig::default());
        assert_eq!(provider.name(), "openai");
    }
}
