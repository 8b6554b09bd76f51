//! Errors from MCP connection, authentication, and tool dispatch.

use thiserror::Error;

/// Errors raised by the MCP tool provider.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum McpError {
    /// Launching the child process or completing the MCP handshake failed.
    #[error("mcp connection failed: {0}")]
    Connection(String),

    /// An MCP protocol-level call (list tools, call tool) failed.
    #[error("mcp protocol error: {0}")]
    Protocol(String),

    /// Authentication (api_key/basic/oauth2) failed outright.
    #[error("mcp auth failed: {0}")]
    AuthFailed(String),

    /// The cached OAuth2 bearer token couldn't be refreshed.
    #[error("mcp token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub(crate) fn from_service_error(err: rmcp::ServiceError) -> McpError {
    McpError::Protocol(err.to_string())
}

pub(crate) fn from_client_init_error(err: rmcp::service::ClientInitializeError) -> McpError {
    McpError::Connection(err.to_string())
}
