//! HTTP status and transport error mapping, per
//! <https://docs.anthropic.com/en/api/errors>.

use crate::types::AnthropicErrorBody;
use lacquer_provider::ProviderError;
use std::time::Duration;

pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<AnthropicErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string());
    match status.as_u16() {
        401 | 403 => ProviderError::AuthFailed(message),
        400 | 404 => ProviderError::InvalidRequest(message),
        429 => ProviderError::RateLimited(None),
        // 529 is Anthropic's own "overloaded" status.
        500..=528 | 530..=599 => ProviderError::ServerError(message),
        _ => ProviderError::InvalidResponse(format!("HTTP {status}: {message}")),
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::RequestFailed(format!("timed out: {err}"))
    } else {
        ProviderError::Other(Box::new(err))
    }
}

pub(crate) fn retry_after_from_header(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_auth_and_rate_limit_status_codes() {
        assert!(matches!(map_http_status(reqwest::StatusCode::UNAUTHORIZED, "{}"), ProviderError::AuthFailed(_)));
        assert!(matches!(map_http_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "{}"), ProviderError::RateLimited(_)));
        assert!(matches!(map_http_status(reqwest::StatusCode::BAD_GATEWAY, "{}"), ProviderError::ServerError(_)));
    }

    #[test]
    fn extracts_the_vendor_error_message_when_present() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"max_tokens too small"}}"#;
        match map_http_status(reqwest::StatusCode::BAD_REQUEST, body) {
            ProviderError::InvalidRequest(msg) => assert_eq!(msg, "max_tokens too small"),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }
}
