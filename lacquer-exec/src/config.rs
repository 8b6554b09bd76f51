//! Executor-wide configuration (C9/C10): defaults a run can override per
//! step or per workflow.

use std::time::Duration;

/// Knobs shared by every step execution and the dispatch loop around it.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Timeout applied to a step's provider call when it declares no
    /// explicit `timeout_ms`.
    pub default_timeout: Duration,
    /// Turn cap for the agent tool-call loop (4.8). Exceeding it fails the
    /// step with `ToolLoopDepthExceeded`.
    pub max_tool_turns: u32,
    /// How many tool-use blocks within a single turn are dispatched
    /// concurrently. The spec default is 1 (sequential, order-preserving).
    pub tool_call_concurrency: usize,
    /// Width of the scheduler's step-dispatch semaphore. 1 forces the
    /// sequential fallback.
    pub max_concurrent_steps: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(120),
            max_tool_turns: 10,
            tool_call_concurrency: 1,
            max_concurrent_steps: 3,
        }
    }
}
