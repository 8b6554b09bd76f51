#![deny(missing_docs)]
//! # lacquer — facade crate
//!
//! A single import surface for the Lacquer workflow runtime. This crate
//! does not parse or validate workflow definitions — it accepts an
//! already-validated [`lacquer_core::Workflow`] and runs it, wrapping
//! `lacquer-exec`'s scheduler with cost-aware [`ExecutionSummary`]
//! assembly.

#[cfg(feature = "core")]
pub use lacquer_context;
#[cfg(feature = "core")]
pub use lacquer_core;
#[cfg(feature = "core")]
pub use lacquer_exec;
#[cfg(feature = "mcp")]
pub use lacquer_mcp;
#[cfg(feature = "provider-anthropic")]
pub use lacquer_provider_anthropic;
#[cfg(feature = "provider-cli")]
pub use lacquer_provider_cli;
#[cfg(feature = "provider-openai")]
pub use lacquer_provider_openai;
#[cfg(feature = "core")]
pub use lacquer_provider;
#[cfg(feature = "core")]
pub use lacquer_template;
#[cfg(feature = "core")]
pub use lacquer_tool;

#[cfg(feature = "core")]
mod cost;
#[cfg(feature = "core")]
mod run;
#[cfg(feature = "core")]
mod summary;

#[cfg(feature = "core")]
pub use cost::{CostModel, NullCostModel, PerTokenCostModel};
#[cfg(feature = "core")]
pub use run::{run_workflow, run_workflow_with};
#[cfg(feature = "core")]
pub use summary::ExecutionSummary;

/// Happy-path imports for running a workflow end to end.
#[cfg(feature = "core")]
pub mod prelude {
    pub use crate::{run_workflow, run_workflow_with, CostModel, ExecutionSummary, NullCostModel, PerTokenCostModel};
    pub use lacquer_context::{ExecutionContext, OverallStatus};
    pub use lacquer_core::{Agent, ExecutionEvent, NullSink, ProgressSink, Step, StepKind, StepResult, StepStatus, Workflow, WorkflowBody};
    pub use lacquer_exec::{ExecError, ExecutorConfig};
    pub use lacquer_provider::{ModelProvider, ProviderRegistry};
    pub use lacquer_tool::{BlockExecutor, ToolRegistry};
}
