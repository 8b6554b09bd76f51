//! Error classification for the local CLI provider.
//!
//! HTTP providers classify retryability from a status code; the CLI has
//! none, so transient-looking failures are recognized by substring match
//! on the underlying error text instead.

use lacquer_provider::ProviderError;

const TRANSIENT_PATTERNS: &[&str] = &[
    "timed out",
    "timeout",
    "connection refused",
    "connection reset",
    "broken pipe",
    "temporarily unavailable",
    "resource temporarily unavailable",
];

/// Classify a subprocess I/O failure (spawn, stdin/stdout error, or a
/// kill-on-timeout) as retryable or not by substring match.
pub(crate) fn classify_io_error(err: &std::io::Error) -> ProviderError {
    let message = err.to_string();
    if is_transient(&message) {
        ProviderError::RequestFailed(message)
    } else {
        ProviderError::Other(Box::new(std::io::Error::new(err.kind(), message)))
    }
}

fn is_transient(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn recognizes_a_timeout_as_retryable() {
        let err = std::io::Error::new(ErrorKind::TimedOut, "operation timed out");
        assert!(matches!(classify_io_error(&err), ProviderError::RequestFailed(_)));
    }

    #[test]
    fn treats_an_unrelated_failure_as_non_retryable() {
        let err = std::io::Error::new(ErrorKind::NotFound, "no such file or directory");
        assert!(!matches!(classify_io_error(&err), ProviderError::RequestFailed(_)));
    }
}
