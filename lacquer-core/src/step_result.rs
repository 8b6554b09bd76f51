//! `StepResult` and its status lifecycle.

use crate::model::TokenUsage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// A step's lifecycle status.
///
/// Transitions only flow forward: `Pending` → (`Running` | `Skipped`),
/// `Running` → (`Completed` | `Failed`). Enforcing this is the scheduler's
/// job (`lacquer-exec`); this type itself is a plain data carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Initial status assigned at context construction.
    Pending,
    /// Dispatched, awaiting completion.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Skipped by `condition`/`skip_if` evaluation.
    Skipped,
}

impl StepStatus {
    /// Whether this status is terminal (no further transitions expected).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped
        )
    }
}

/// The outcome of executing (or skipping) one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// The step's id.
    pub step_id: String,
    /// Current lifecycle status.
    pub status: StepStatus,
    /// When the step started running. `None` while `Pending`.
    #[serde(default)]
    pub started_at: Option<SystemTime>,
    /// When the step reached a terminal status. `None` until then.
    #[serde(default)]
    pub ended_at: Option<SystemTime>,
    /// Structured output, keyed for access as `steps.<id>.<key>`.
    #[serde(default)]
    pub output: HashMap<String, serde_json::Value>,
    /// Primary text response, for agent steps.
    #[serde(default)]
    pub response: Option<String>,
    /// Error text, set only when `status == Failed`.
    #[serde(default)]
    pub error: Option<String>,
    /// Token accounting, for agent steps that called a model.
    #[serde(default)]
    pub token_usage: TokenUsage,
    /// Number of retry attempts consumed by this step's provider calls.
    #[serde(default)]
    pub retries: u32,
}

impl StepResult {
    /// A fresh `Pending` result for a step id, as created at context
    /// construction — exactly one per declared step id.
    pub fn pending(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            status: StepStatus::Pending,
            started_at: None,
            ended_at: None,
            output: HashMap::new(),
            response: None,
            error: None,
            token_usage: TokenUsage::default(),
            retries: 0,
        }
    }

    /// Mark this result `Running`, recording the start time.
    pub fn mark_running(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(SystemTime::now());
    }

    /// Mark this result `Skipped` and stamp an end time.
    pub fn mark_skipped(&mut self) {
        self.status = StepStatus::Skipped;
        self.ended_at = Some(SystemTime::now());
    }

    /// Mark this result `Failed` with the given error text.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.error = Some(error.into());
        self.ended_at = Some(SystemTime::now());
    }

    /// Mark this result `Completed`, attaching output/response/usage.
    pub fn mark_completed(
        &mut self,
        output: HashMap<String, serde_json::Value>,
        response: Option<String>,
        token_usage: TokenUsage,
    ) {
        self.status = StepStatus::Completed;
        self.output = output;
        self.response = response;
        self.token_usage = token_usage;
        self.ended_at = Some(SystemTime::now());
    }

    /// Wall-clock duration between start and end, if both are recorded.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => end.duration_since(start).ok(),
            _ => None,
        }
    }

    /// Whether this result counts as a success for dependency purposes.
    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_has_no_timestamps() {
        let r = StepResult::pending("s1");
        assert_eq!(r.status, StepStatus::Pending);
        assert!(r.started_at.is_none());
        assert!(r.duration().is_none());
    }

    #[test]
    fn completed_records_duration() {
        let mut r = StepResult::pending("s1");
        r.mark_running();
        std::thread::sleep(Duration::from_millis(1));
        r.mark_completed(HashMap::new(), Some("ok".into()), TokenUsage::default());
        assert!(r.duration().unwrap() >= Duration::from_millis(1));
        assert!(r.status.is_terminal());
    }

    #[test]
    fn failed_carries_error_text() {
        let mut r = StepResult::pending("s1");
        r.mark_running();
        r.mark_failed("boom");
        assert_eq!(r.error.as_deref(), Some("boom"));
        assert_eq!(r.status, StepStatus::Failed);
    }
}
