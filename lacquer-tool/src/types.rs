//! Shared types for tool registration and results.

use lacquer_core::ToolDefinition;

/// What a tool call registers: the vendor-facing definition plus whatever
/// extra, provider-specific configuration its provider needs (a script's
/// runtime and source, an MCP tool's server alias).
#[derive(Debug, Clone)]
pub struct ToolRegistration {
    /// The common `{name, description, type, parameters}` definition,
    /// exposed to the model as a `ToolDefinition`.
    pub definition: ToolDefinition,
    /// Provider-specific configuration, opaque to the registry.
    pub provider_config: serde_json::Value,
}

/// The outcome of one `execute_tool` call.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Result content, fed back to the model as a `tool_result` block.
    pub content: String,
    /// Whether execution errored (distinct from the registry/provider
    /// failing to even dispatch the call).
    pub is_error: bool,
}

impl ToolResult {
    /// Build a successful result from any JSON-serializable value.
    pub fn ok(value: impl Into<String>) -> Self {
        Self { content: value.into(), is_error: false }
    }

    /// Build a failed result carrying an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self { content: message.into(), is_error: true }
    }
}
