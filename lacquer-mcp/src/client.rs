//! MCP tool provider: connects to (or launches) an MCP endpoint, discovers
//! its tools, and dispatches `execute_tool` calls over the protocol.

use std::collections::HashSet;

use async_trait::async_trait;
use rmcp::ServiceExt;
use rmcp::model::{CallToolRequestParams, CallToolResult, Content, RawContent, Tool as McpTool};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::child_process::TokioChildProcess;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransport;
use tokio::sync::RwLock;

use lacquer_context::ExecutionContext;
use lacquer_core::{ToolDefinition, ToolType};
use lacquer_tool::{ToolError, ToolProvider, ToolRegistration, ToolResult};

use crate::auth::{authenticated_url, AuthMode, TokenCache};
use crate::error::{from_client_init_error, from_service_error, McpError};

/// Connects to (local child process, or remote streamable-HTTP) an MCP
/// endpoint and exposes its tools through [`ToolProvider`].
pub struct McpToolProvider {
    service: RunningService<RoleClient, ()>,
    known_tools: RwLock<HashSet<String>>,
}

impl McpToolProvider {
    /// Launch a local MCP server as a child process and complete the
    /// handshake over stdio.
    pub async fn connect_stdio(command: tokio::process::Command) -> Result<Self, McpError> {
        let transport = TokioChildProcess::new(command).map_err(|e| McpError::Connection(e.to_string()))?;
        let service = ().serve(transport).await.map_err(from_client_init_error)?;
        Ok(Self { service, known_tools: RwLock::new(HashSet::new()) })
    }

    /// Connect to a remote MCP endpoint over streamable HTTP, authenticating
    /// per `auth` (proactively refreshing an OAuth2 bearer token via
    /// `token_cache` when that mode is used).
    pub async fn connect_http(base_url: &str, auth: AuthMode, token_cache: &TokenCache) -> Result<Self, McpError> {
        let url = authenticated_url(base_url, &auth, token_cache).await?;
        let transport = StreamableHttpClientTransport::from_uri(url);
        let service = ().serve(transport).await.map_err(from_client_init_error)?;
        Ok(Self { service, known_tools: RwLock::new(HashSet::new()) })
    }

    /// List every tool the connected server exposes, as uniform
    /// [`ToolDefinition`]s (useful for populating the workflow's tool
    /// registry without hand-declaring each MCP tool).
    pub async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, McpError> {
        let tools = self.service.list_all_tools().await.map_err(from_service_error)?;
        let mut known = self.known_tools.write().await;
        let mut out = Vec::with_capacity(tools.len());
        for tool in tools {
            known.insert(tool.name.to_string());
            out.push(to_tool_definition(&tool));
        }
        Ok(out)
    }

    /// Shut down the connection.
    pub async fn close(self) -> Result<(), McpError> {
        self.service.cancel().await.map_err(from_service_error)?;
        Ok(())
    }
}

fn to_tool_definition(tool: &McpTool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name.to_string(),
        description: tool.description.as_deref().unwrap_or("").to_string(),
        tool_type: ToolType::Mcp,
        parameters: serde_json::to_value(&*tool.input_schema).unwrap_or_else(|_| serde_json::json!({"type": "object"})),
    }
}

fn extract_text(content: &[Content]) -> String {
    content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ToolProvider for McpToolProvider {
    fn tool_type(&self) -> ToolType {
        ToolType::Mcp
    }

    async fn add_tool(&self, registration: ToolRegistration) -> Result<(), ToolError> {
        let name = registration.definition.name;
        if !self.known_tools.read().await.contains(&name) {
            // The server may have registered tools after the last discovery
            // pass; re-discover once before rejecting.
            drop(self.discover_tools().await.map_err(|e| ToolError::ExecutionFailed(e.to_string()))?);
        }
        if self.known_tools.read().await.contains(&name) {
            Ok(())
        } else {
            Err(ToolError::NotFound(format!("mcp server doesn't expose tool {name}")))
        }
    }

    async fn execute_tool(&self, tool_name: &str, raw_params_json: &str, _exec_ctx: &ExecutionContext) -> Result<ToolResult, ToolError> {
        let arguments: serde_json::Value =
            serde_json::from_str(raw_params_json).map_err(|e| ToolError::InvalidInput(format!("raw_params_json: {e}")))?;
        let arguments = arguments.as_object().cloned();

        let params = CallToolRequestParams { meta: None, name: tool_name.to_string().into(), arguments, task: None };
        let result: CallToolResult = self
            .service
            .peer()
            .call_tool(params)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let text = extract_text(&result.content);
        Ok(ToolResult { content: text, is_error: result.is_error.unwrap_or(false) })
    }

    async fn close(&self) -> Result<(), ToolError> {
        // `RunningService::cancel` consumes `self`; the shared registry only
        // ever holds an `Arc<dyn ToolProvider>`, so there's no owned service
        // left to cancel here. Call the inherent `close` (which does consume
        // it) before handing the provider to a registry if a clean MCP
        // shutdown is required.
        Ok(())
    }
}

