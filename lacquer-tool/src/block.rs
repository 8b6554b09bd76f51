//! The "block executor" collaborator: compiles and runs Go script tools.
//!
//! Deliberately out of scope for this crate — a generic interface is
//! assumed, the same way the runtime assumes a validated workflow AST
//! rather than parsing one itself.

use async_trait::async_trait;

use crate::error::ToolError;

/// Compiles and executes a Go script tool with structured input/output.
#[async_trait]
pub trait BlockExecutor: Send + Sync {
    /// Run `source` with `inputs`, returning its structured JSON output.
    async fn execute(&self, source: &str, inputs: &serde_json::Value) -> Result<serde_json::Value, ToolError>;
}

/// A [`BlockExecutor`] that always fails. The default when no real block
/// executor has been wired in — e.g. in tests that never register a `go`
/// script tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredBlockExecutor;

#[async_trait]
impl BlockExecutor for UnconfiguredBlockExecutor {
    async fn execute(&self, _source: &str, _inputs: &serde_json::Value) -> Result<serde_json::Value, ToolError> {
        Err(ToolError::ExecutionFailed("no block executor configured for go script tools".to_string()))
    }
}
