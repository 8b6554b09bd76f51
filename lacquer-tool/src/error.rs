//! Errors from tool registration and execution.

use thiserror::Error;

use lacquer_core::ToolType;

/// Errors from tool operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found in the registry.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// A tool with this name is already owned by a different provider.
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),

    /// A provider is already registered for this `ToolType`.
    #[error("duplicate provider for tool type: {0:?}")]
    DuplicateProvider(ToolType),

    /// A script tool's stdout wasn't a well-formed JSON object.
    #[error("script output malformed: {0}")]
    ScriptOutputMalformed(String),

    /// The script process exited non-zero or couldn't be spawned.
    #[error("script execution failed: {0}")]
    ScriptFailed(String),

    /// Tool execution failed for a reason specific to the provider.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The input provided to the tool was invalid.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
