//! # lacquer-tool — tool registry and script execution (C8)
//!
//! A [`ToolRegistry`] owns at most one [`ToolProvider`] per
//! [`lacquer_core::ToolType`] and dispatches `execute_tool` calls by
//! looking up which provider owns a given tool name. [`ScriptToolProvider`]
//! is the `Script`-type provider: it dispatches `go` tools through an
//! external [`BlockExecutor`] and runs `python`/`bash`/`js` tools as
//! subprocesses.

#![deny(missing_docs)]

mod block;
mod error;
mod provider;
mod registry;
mod script;
mod types;

pub use block::{BlockExecutor, UnconfiguredBlockExecutor};
pub use error::ToolError;
pub use provider::ToolProvider;
pub use registry::ToolRegistry;
pub use script::{ScriptRuntime, ScriptToolProvider};
pub use types::{ToolRegistration, ToolResult};
