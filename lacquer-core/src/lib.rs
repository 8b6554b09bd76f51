//! # lacquer-core — data model for the Lacquer workflow runtime
//!
//! This crate defines the types that cross every boundary of the runtime:
//! typed ids, the stable `DurationMs` wire type, the model content-block
//! union, the workflow AST consumed from a validated parser, `StepResult`
//! and its status lifecycle, and the `ExecutionEvent` stream.
//!
//! Nothing in this crate executes anything — it is pure data plus the
//! small invariant-preserving methods each type needs (`StepResult`'s
//! `mark_*` transitions, `RunId::generate`). Scheduling, evaluation, and
//! provider dispatch live in `lacquer-exec`, `lacquer-template`, and
//! `lacquer-provider` respectively, all of which depend on this crate.

#![deny(missing_docs)]

pub mod content;
pub mod events;
pub mod id;
pub mod model;
pub mod step_result;
pub mod workflow;

mod duration;

pub use content::{concat_text, partition_tool_use, ContentBlock, ImageSource};
pub use duration::DurationMs;
pub use events::{ExecutionEvent, ExecutionEventKind, NullSink, ProgressSink};
pub use id::{AgentId, RunId, StepId};
pub use model::{ModelMessage, ModelRequest, Role, SamplingParams, TokenUsage, ToolDefinition, ToolType};
pub use step_result::{StepResult, StepStatus};
pub use workflow::{Agent, Step, StepKind, Workflow, WorkflowBody};
