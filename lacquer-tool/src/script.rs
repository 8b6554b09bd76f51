//! Script tool provider: dispatches by declared runtime (`go`, `python`,
//! `bash`, `js`).
//!
//! Go scripts run through an external [`BlockExecutor`] that compiles and
//! runs them with structured input/output. The other runtimes are written
//! to a file in a workspace directory and invoked with their interpreter,
//! with `LACQUER_INPUTS=<json>` in the child's environment; stdout must be
//! a single JSON object or the call surfaces `ScriptOutputMalformed`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::RwLock;

use lacquer_context::ExecutionContext;
use lacquer_core::ToolType;

use crate::block::{BlockExecutor, UnconfiguredBlockExecutor};
use crate::error::ToolError;
use crate::provider::ToolProvider;
use crate::types::{ToolRegistration, ToolResult};

/// A script tool's declared runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptRuntime {
    /// Compiled and run through a `BlockExecutor`.
    Go,
    /// Invoked via `python3`.
    Python,
    /// Invoked via `sh`.
    Bash,
    /// Invoked via `node`.
    Js,
}

impl ScriptRuntime {
    fn interpreter(self) -> &'static str {
        match self {
            ScriptRuntime::Go => unreachable!("go dispatches through BlockExecutor, not an interpreter"),
            ScriptRuntime::Python => "python3",
            ScriptRuntime::Bash => "sh",
            ScriptRuntime::Js => "node",
        }
    }

    fn file_extension(self) -> &'static str {
        match self {
            ScriptRuntime::Go => "go",
            ScriptRuntime::Python => "py",
            ScriptRuntime::Bash => "sh",
            ScriptRuntime::Js => "js",
        }
    }
}

/// `provider_config` shape a script tool registers with:
/// `{"runtime": "python", "source": "..."}`.
#[derive(Debug, Clone, Deserialize)]
struct ScriptSpec {
    runtime: ScriptRuntime,
    source: String,
}

struct RegisteredScript {
    spec: ScriptSpec,
}

/// Executes `Script`-type tools by runtime.
pub struct ScriptToolProvider {
    workspace_dir: PathBuf,
    block_executor: Arc<dyn BlockExecutor>,
    scripts: RwLock<HashMap<String, RegisteredScript>>,
}

impl ScriptToolProvider {
    /// Build a provider rooted at `workspace_dir`, using `block_executor`
    /// for `go` tools.
    pub fn new(workspace_dir: impl Into<PathBuf>, block_executor: Arc<dyn BlockExecutor>) -> Self {
        Self { workspace_dir: workspace_dir.into(), block_executor, scripts: RwLock::new(HashMap::new()) }
    }

    /// Build a provider with no block executor configured; `go` tools will
    /// fail until one is supplied via [`ScriptToolProvider::new`].
    pub fn with_workspace(workspace_dir: impl Into<PathBuf>) -> Self {
        Self::new(workspace_dir, Arc::new(UnconfiguredBlockExecutor))
    }

    async fn run_interpreted(&self, runtime: ScriptRuntime, source: &str, name: &str, raw_params_json: &str) -> Result<ToolResult, ToolError> {
        let script_path = self.workspace_dir.join(format!("{name}.{}", runtime.file_extension()));
        tokio::fs::create_dir_all(&self.workspace_dir)
            .await
            .map_err(|e| ToolError::ScriptFailed(format!("creating workspace dir: {e}")))?;
        tokio::fs::write(&script_path, source)
            .await
            .map_err(|e| ToolError::ScriptFailed(format!("writing script file: {e}")))?;

        let output = Command::new(runtime.interpreter())
            .arg(&script_path)
            .current_dir(&self.workspace_dir)
            .env("LACQUER_INPUTS", raw_params_json)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ToolError::ScriptFailed(format!("spawning {}: {e}", runtime.interpreter())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::ScriptFailed(format!("exited with {}: {stderr}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: serde_json::Value = serde_json::from_str(stdout.trim())
            .map_err(|e| ToolError::ScriptOutputMalformed(format!("stdout was not valid JSON: {e}")))?;
        if !parsed.is_object() {
            return Err(ToolError::ScriptOutputMalformed("stdout must be a JSON object".to_string()));
        }

        Ok(ToolResult::ok(parsed.to_string()))
    }
}

#[async_trait]
impl ToolProvider for ScriptToolProvider {
    fn tool_type(&self) -> ToolType {
        ToolType::Script
    }

    async fn add_tool(&self, registration: ToolRegistration) -> Result<(), ToolError> {
        let spec: ScriptSpec = serde_json::from_value(registration.provider_config)
            .map_err(|e| ToolError::InvalidInput(format!("script tool config: {e}")))?;
        self.scripts.write().await.insert(registration.definition.name, RegisteredScript { spec });
        Ok(())
    }

    async fn execute_tool(&self, tool_name: &str, raw_params_json: &str, _exec_ctx: &ExecutionContext) -> Result<ToolResult, ToolError> {
        let scripts = self.scripts.read().await;
        let registered = scripts.get(tool_name).ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        match registered.spec.runtime {
            ScriptRuntime::Go => {
                let inputs: serde_json::Value = serde_json::from_str(raw_params_json)
                    .map_err(|e| ToolError::InvalidInput(format!("raw_params_json: {e}")))?;
                let output = self.block_executor.execute(&registered.spec.source, &inputs).await?;
                Ok(ToolResult::ok(output.to_string()))
            }
            runtime => self.run_interpreted(runtime, &registered.spec.source, tool_name, raw_params_json).await,
        }
    }
}
