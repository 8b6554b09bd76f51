//! The model-provider contract (C6).
//!
//! Unlike the teacher's `Provider` trait, this one is deliberately
//! object-safe: the scheduler holds providers as `Arc<dyn ModelProvider>`
//! behind a [`ProviderRegistry`], so RPITIT (which can't cross a trait
//! object boundary) is out; `async_trait` is in.

use crate::types::ModelInfo;
use async_trait::async_trait;
use lacquer_context::ExecutionContext;
use lacquer_core::{ModelRequest, ProgressSink, TokenUsage};
use thiserror::Error;

use crate::types::ModelResponse;

/// Errors a model provider can raise.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP/transport call failed outright (connection refused, DNS,
    /// timed out before any status was received).
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The vendor rate-limited the request. Carries a suggested backoff if
    /// the vendor returned a `Retry-After` header.
    #[error("rate limited{}", retry_after_suffix(.0))]
    RateLimited(Option<std::time::Duration>),

    /// The vendor returned a server error (HTTP 5xx).
    #[error("server error: {0}")]
    ServerError(String),

    /// Authentication or authorization failed — never retried.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// The request was rejected as invalid — never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The vendor's response couldn't be parsed into a `ModelResponse`.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The named model isn't in the provider's catalog.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// Catch-all for anything else, including transient I/O errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

fn retry_after_suffix(retry_after: &Option<std::time::Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}ms)", d.as_millis()),
        None => String::new(),
    }
}

impl ProviderError {
    /// The structured retry predicate: HTTP ≥500, HTTP 429, or a transient
    /// I/O-shaped failure are retryable. Authentication and validation
    /// failures never are — retrying them can't change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited(_) | ProviderError::ServerError(_) | ProviderError::RequestFailed(_)
        )
    }
}

/// Uniform per-vendor model access: `Generate`, `ListModels`, `GetName`,
/// `Close`.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send one generation request and await the full response. Providers
    /// implement their own retry/backoff internally (see
    /// [`crate::retry::with_retry`]) so callers never need to retry
    /// themselves.
    ///
    /// `ctx` is raced against every in-flight suspension point (the HTTP
    /// call itself, and any retry backoff) so a cancelled run doesn't wait
    /// out a long timeout or backoff it has no further use for. `step_id`
    /// and `sink` let the provider report `StepRetrying` progress events
    /// without the scheduler having to reach inside the retry loop.
    async fn generate(
        &self,
        request: &ModelRequest,
        ctx: &ExecutionContext,
        step_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ModelResponse, ProviderError>;

    /// List the models this provider currently serves.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError>;

    /// The provider's name, as referenced by `Agent::provider` in a
    /// workflow definition (e.g. `"anthropic"`, `"openai"`, `"cli"`).
    fn name(&self) -> &str;

    /// Release any held resources (connection pools, subprocess handles).
    /// The default no-op is correct for stateless HTTP providers.
    async fn close(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Convenience accumulator some providers use while summing multi-turn
/// token usage before it's folded into a `ModelResponse`.
pub fn accumulate_usage(a: TokenUsage, b: TokenUsage) -> TokenUsage {
    a + b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_and_server_error_are_retryable() {
        assert!(ProviderError::RateLimited(None).is_retryable());
        assert!(ProviderError::ServerError("502".into()).is_retryable());
        assert!(ProviderError::RequestFailed("timeout".into()).is_retryable());
    }

    #[test]
    fn auth_and_validation_failures_are_not_retryable() {
        assert!(!ProviderError::AuthFailed("bad key".into()).is_retryable());
        assert!(!ProviderError::InvalidRequest("bad schema".into()).is_retryable());
        assert!(!ProviderError::UnknownModel("ghost".into()).is_retryable());
    }

    #[test]
    fn rate_limited_display_includes_retry_after() {
        let err = ProviderError::RateLimited(Some(std::time::Duration::from_millis(250)));
        assert!(err.to_string().contains("250ms"));
    }
}
