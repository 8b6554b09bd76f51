//! The tool-provider contract (C8).
//!
//! A provider owns every tool of one [`ToolType`] — script, MCP, or
//! native. The registry dispatches `execute_tool` by looking up which
//! provider owns a given tool name, not by type, so a single workflow can
//! mix script and MCP tools freely.

use async_trait::async_trait;
use lacquer_core::ToolType;
use lacquer_context::ExecutionContext;

use crate::error::ToolError;
use crate::types::{ToolRegistration, ToolResult};

/// One source of tool implementations (script runner, MCP client, or a
/// natively-implemented tool set).
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Which `ToolType` this provider serves. The registry allows exactly
    /// one provider per type.
    fn tool_type(&self) -> ToolType;

    /// Register one tool this provider will serve `execute_tool` calls
    /// for. Providers that need more than the common `ToolDefinition`
    /// fields (a script's runtime and source, say) read them out of
    /// `registration.provider_config`.
    async fn add_tool(&self, registration: ToolRegistration) -> Result<(), ToolError>;

    /// Invoke a previously-registered tool.
    async fn execute_tool(
        &self,
        tool_name: &str,
        raw_params_json: &str,
        exec_ctx: &ExecutionContext,
    ) -> Result<ToolResult, ToolError>;

    /// Release any held resources (subprocess handles, MCP connections).
    async fn close(&self) -> Result<(), ToolError> {
        Ok(())
    }
}
