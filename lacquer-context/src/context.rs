//! The per-run [`ExecutionContext`] (C5): owns the mutable `state` map and
//! every step's [`StepResult`], guarded by a single reader-writer lock so
//! readers always observe a consistent `(state, step_results)` pair.
//!
//! The process environment is captured once, at construction — snapshotting
//! later would let a step observe an environment that changed mid-run,
//! which would make `env.*` lookups non-reproducible within a single run.

use lacquer_core::{RunId, StepResult, StepStatus, TokenUsage, Workflow};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::SystemTime;
use tokio::sync::Notify;

/// Derived run status, per the scheduler's `getOverallStatus` rule:
/// cancellation wins over everything, then any failure, then any step
/// still running, then — only once every step has reached a terminal
/// status — completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// At least one step is still `Running` (or none have started yet).
    Running,
    /// Every step is `Completed` or `Skipped`.
    Completed,
    /// At least one step is `Failed`. The scheduler drains in-flight work
    /// rather than cancelling it, so this can coexist with `Running` steps;
    /// once nothing is left running the run is reported `Failed`.
    Failed,
    /// The run's cancellation handle fired.
    Cancelled,
}

struct Locked {
    state: HashMap<String, serde_json::Value>,
    step_results: HashMap<String, StepResult>,
    completed_at: Option<SystemTime>,
}

/// Owns everything one workflow run needs beyond the immutable [`Workflow`]
/// definition: the run id, the input payload, a snapshot of the process
/// environment, and the mutable state/step-result pair.
pub struct ExecutionContext {
    run_id: RunId,
    start_time: SystemTime,
    inputs: serde_json::Value,
    metadata: HashMap<String, serde_json::Value>,
    step_order: Vec<String>,
    env_snapshot: HashMap<String, String>,
    cancelled: AtomicBool,
    cancel_notify: Notify,
    locked: RwLock<Locked>,
}

impl ExecutionContext {
    /// Build a fresh context for one run of `workflow`: assigns a new
    /// [`RunId`], pre-populates `state` from the workflow's initial state
    /// block, and creates exactly one `Pending` [`StepResult`] per declared
    /// step.
    pub fn new(workflow: &Workflow, inputs: serde_json::Value) -> Self {
        let step_order: Vec<String> = workflow.workflow.steps.iter().map(|s| s.id.clone()).collect();
        let step_results = step_order
            .iter()
            .map(|id| (id.clone(), StepResult::pending(id.clone())))
            .collect();
        Self {
            run_id: RunId::generate(),
            start_time: SystemTime::now(),
            inputs,
            metadata: workflow.metadata.clone(),
            step_order,
            env_snapshot: std::env::vars().collect(),
            cancelled: AtomicBool::new(false),
            cancel_notify: Notify::new(),
            locked: RwLock::new(Locked {
                state: workflow.workflow.state.clone(),
                step_results,
                completed_at: None,
            }),
        }
    }

    /// This run's identifier.
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// When this run started.
    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    /// The raw input payload passed to the run.
    pub fn inputs(&self) -> &serde_json::Value {
        &self.inputs
    }

    /// Workflow-level metadata, visible to templates as `metadata.*`. Kept
    /// separate from `workflow.*`'s contractual run-bookkeeping fields.
    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Total number of declared steps.
    pub fn total_steps(&self) -> usize {
        self.step_order.len()
    }

    /// 1-based position of `step_id` in declaration order, or `None` if
    /// unknown.
    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.step_order.iter().position(|id| id == step_id).map(|i| i + 1)
    }

    /// Look up an environment variable captured at construction time. A
    /// missing key is an empty string, never an error.
    pub fn env(&self, key: &str) -> String {
        self.env_snapshot.get(key).cloned().unwrap_or_default()
    }

    /// Read a single state key.
    pub fn get_state(&self, key: &str) -> Option<serde_json::Value> {
        self.locked.read().expect("execution context lock poisoned").state.get(key).cloned()
    }

    /// A deep copy of the entire state map, for `GetAllState` callers
    /// (output rendering, snapshotting for observability).
    pub fn all_state(&self) -> HashMap<String, serde_json::Value> {
        self.locked.read().expect("execution context lock poisoned").state.clone()
    }

    /// Write a single state key.
    pub fn set_state(&self, key: impl Into<String>, value: serde_json::Value) {
        self.locked.write().expect("execution context lock poisoned").state.insert(key.into(), value);
    }

    /// Apply a batch of state updates atomically with respect to other
    /// readers/writers (a step's `updates` block is applied as one unit).
    pub fn apply_updates(&self, updates: HashMap<String, serde_json::Value>) {
        let mut guard = self.locked.write().expect("execution context lock poisoned");
        guard.state.extend(updates);
    }

    /// A clone of one step's current result.
    pub fn step_result(&self, step_id: &str) -> Option<StepResult> {
        self.locked.read().expect("execution context lock poisoned").step_results.get(step_id).cloned()
    }

    /// Transition a step to `Running`.
    pub fn mark_step_running(&self, step_id: &str) {
        if let Some(r) = self.locked.write().expect("execution context lock poisoned").step_results.get_mut(step_id) {
            r.mark_running();
        }
    }

    /// Transition a step to `Skipped`.
    pub fn mark_step_skipped(&self, step_id: &str) {
        if let Some(r) = self.locked.write().expect("execution context lock poisoned").step_results.get_mut(step_id) {
            r.mark_skipped();
        }
    }

    /// Transition a step to `Failed`.
    pub fn mark_step_failed(&self, step_id: &str, error: impl Into<String>) {
        if let Some(r) = self.locked.write().expect("execution context lock poisoned").step_results.get_mut(step_id) {
            r.mark_failed(error);
        }
    }

    /// Transition a step to `Completed`.
    pub fn mark_step_completed(
        &self,
        step_id: &str,
        output: HashMap<String, serde_json::Value>,
        response: Option<String>,
        token_usage: TokenUsage,
    ) {
        if let Some(r) = self.locked.write().expect("execution context lock poisoned").step_results.get_mut(step_id) {
            r.mark_completed(output, response, token_usage);
        }
    }

    /// Record the moment the whole run reached a terminal status, for
    /// `workflow.completed_at`.
    pub fn mark_workflow_completed(&self) {
        self.locked.write().expect("execution context lock poisoned").completed_at = Some(SystemTime::now());
    }

    /// When the run reached a terminal status, if it has.
    pub fn completed_at(&self) -> Option<SystemTime> {
        self.locked.read().expect("execution context lock poisoned").completed_at
    }

    /// Signal cancellation. Idempotent. Wakes every task currently
    /// suspended in [`Self::cancelled`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.cancel_notify.notify_waiters();
    }

    /// Whether this run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once this run is cancelled — immediately if it already is.
    ///
    /// Meant to be raced via `tokio::select!` against an in-flight HTTP
    /// call, subprocess read, tool invocation, or retry backoff, so
    /// cancellation interrupts whatever a step is currently suspended on
    /// rather than only being observed between dispatch-loop ticks.
    pub async fn cancelled(&self) {
        // The `Notified` future must be constructed before the flag check
        // below: `Notify::notify_waiters` only wakes futures that already
        // exist, so checking the flag first could race a `cancel()` that
        // lands in between, leaving this task waiting forever.
        let notified = self.cancel_notify.notified();
        tokio::pin!(notified);
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Derive the run's overall status from cancellation plus every step's
    /// current status.
    pub fn overall_status(&self) -> OverallStatus {
        if self.is_cancelled() {
            return OverallStatus::Cancelled;
        }
        let guard = self.locked.read().expect("execution context lock poisoned");
        let mut any_failed = false;
        let mut any_running = false;
        let mut all_terminal_ok = true;
        for id in &self.step_order {
            let status = guard.step_results.get(id).map(|r| r.status).unwrap_or(StepStatus::Pending);
            match status {
                StepStatus::Failed => any_failed = true,
                StepStatus::Running => any_running = true,
                StepStatus::Pending => all_terminal_ok = false,
                StepStatus::Completed | StepStatus::Skipped => {}
            }
        }
        if any_failed && !any_running {
            OverallStatus::Failed
        } else if any_running || any_failed {
            OverallStatus::Running
        } else if all_terminal_ok {
            OverallStatus::Completed
        } else {
            OverallStatus::Running
        }
    }
}
