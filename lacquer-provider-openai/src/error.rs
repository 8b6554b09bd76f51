//! HTTP status and transport error mapping for the OpenAI API.

use crate::types::OpenAiErrorBody;
use lacquer_provider::ProviderError;

pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<OpenAiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string());
    match status.as_u16() {
        401 | 403 => ProviderError::AuthFailed(message),
        400 | 404 => ProviderError::InvalidRequest(message),
        429 => ProviderError::RateLimited(None),
        500..=599 => ProviderError::ServerError(message),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_rate_limit_and_server_errors() {
        assert!(matches!(map_http_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "{}"), ProviderError::RateLimited(_)));
        assert!(matches!(map_http_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "{}"), ProviderError::ServerError(_)));
    }
}
