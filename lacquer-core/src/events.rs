//! `ExecutionEvent`, the stream emitted to a caller-supplied progress sink
//! emitted by the scheduler.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One event in the execution event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// The step this event concerns, if any (workflow-level events omit it).
    #[serde(default)]
    pub step_id: Option<String>,
    /// 1-based position of the step within the workflow's step list.
    #[serde(default)]
    pub step_index: Option<usize>,
    /// What happened.
    pub kind: ExecutionEventKind,
    /// Duration, present on completion/failure/skip events.
    #[serde(default)]
    pub duration: Option<Duration>,
    /// Error text, present on failure events.
    #[serde(default)]
    pub error: Option<String>,
    /// Attempt number, present on retry events (1-based).
    #[serde(default)]
    pub attempt: Option<u32>,
    /// Arbitrary extra metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// The kind of thing that happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionEventKind {
    /// The workflow began its dispatch loop.
    WorkflowStarted,
    /// The workflow reached `Completed`.
    WorkflowCompleted,
    /// The workflow reached `Failed`.
    WorkflowFailed,
    /// A step was dispatched.
    StepStarted,
    /// A step reached `Completed`.
    StepCompleted,
    /// A step reached `Failed`.
    StepFailed,
    /// A step was evaluated and skipped.
    StepSkipped,
    /// A step's provider call is being retried.
    StepRetrying,
    /// An intermediate diagnostic from a provider mid-exchange (e.g. one
    /// streamed line from a local CLI subprocess), surfaced only by
    /// providers whose configuration opts into per-line progress —
    /// most providers never emit this.
    StepProgress,
}

impl ExecutionEvent {
    /// Build a minimal workflow-level event (no step fields set).
    pub fn workflow(run_id: impl Into<String>, kind: ExecutionEventKind) -> Self {
        Self {
            run_id: run_id.into(),
            step_id: None,
            step_index: None,
            kind,
            duration: None,
            error: None,
            attempt: None,
            metadata: HashMap::new(),
        }
    }

    /// Build a step-level event.
    pub fn step(
        run_id: impl Into<String>,
        step_id: impl Into<String>,
        step_index: usize,
        kind: ExecutionEventKind,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            step_id: Some(step_id.into()),
            step_index: Some(step_index),
            kind,
            duration: None,
            error: None,
            attempt: None,
            metadata: HashMap::new(),
        }
    }

    /// Attach a duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Attach error text.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attach a retry attempt number.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A sink that receives the execution event stream.
///
/// Must tolerate being absent; callers that don't care pass [`NullSink`].
pub trait ProgressSink: Send + Sync {
    /// Receive one event. Must not block for long; the scheduler calls this
    /// synchronously from the step that produced the event.
    fn emit(&self, event: ExecutionEvent);
}

/// A [`ProgressSink`] that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ExecutionEvent) {}
}
