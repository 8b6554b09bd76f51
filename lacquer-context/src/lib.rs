//! # lacquer-context — variable resolver and execution context
//!
//! Implements C4 (the variable resolver, projecting dotted paths onto
//! `inputs`/`state`/`steps`/`metadata`/`env`/`workflow`) and C5 (the
//! per-run [`ExecutionContext`] that owns state, step results, and the
//! environment snapshot). [`lacquer_template::Resolver`] is implemented by
//! [`StepResolver`], a thin per-step view over the shared context — the
//! only field that differs per step is `workflow.step_index`.

#![deny(missing_docs)]

mod context;
mod resolver;

pub use context::{ExecutionContext, OverallStatus};
pub use resolver::StepResolver;
