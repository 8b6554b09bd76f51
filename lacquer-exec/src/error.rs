//! Errors from step execution and workflow scheduling (C9/C10).

use thiserror::Error;

/// Everything that can go wrong executing one step or scheduling a run.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecError {
    /// The workflow's declared inputs didn't satisfy its input contract.
    #[error("input validation failed: {0}")]
    InputValidationFailed(String),

    /// An `Action` step named an action the executor doesn't know.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// A step's `kind` discriminator wasn't one of `agent`/`block`/`action`.
    #[error("unknown step kind: {0}")]
    UnknownStepKind(String),

    /// A `{{ … }}` fragment failed to tokenize or parse.
    #[error(transparent)]
    TemplateParseError(#[from] lacquer_template::TemplateError),

    /// An expression failed outside of a template splice (bare
    /// `condition`/`skip_if` evaluation).
    #[error(transparent)]
    TemplateEvaluationError(#[from] lacquer_template::ExpressionError),

    /// No agent configuration with the referenced name exists.
    #[error("agent not found: {0}")]
    NotFound(String),

    /// The referenced provider name isn't registered.
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    /// The agent's model isn't in the provider's catalog.
    #[error("model not supported: {0}")]
    ModelNotSupported(String),

    /// The provider call failed transiently (already retried internally by
    /// the provider adapter; this is the final, still-failing outcome).
    #[error("provider error: {0}")]
    ProviderTransient(String),

    /// The provider call failed permanently (auth, invalid request).
    #[error("provider error: {0}")]
    ProviderPermanent(String),

    /// The agent tool-call loop exceeded its configured turn cap.
    #[error("tool loop depth exceeded ({0} turns)")]
    ToolLoopDepthExceeded(u32),

    /// A tool-use block named a tool no provider owns.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// A script tool's stdout wasn't a JSON object.
    #[error("script output malformed: {0}")]
    ScriptOutputMalformed(String),

    /// A step's (or the executor's default) timeout elapsed before it
    /// completed.
    #[error("step timed out after {0:?}")]
    StepTimeout(std::time::Duration),

    /// The run's cancellation handle fired.
    #[error("workflow cancelled")]
    WorkflowCancelled,

    /// The ready set emptied with nothing executing and no recorded error:
    /// every remaining step is waiting on a dependency that will never
    /// complete.
    #[error("workflow deadlocked: steps {0:?} never became ready")]
    WorkflowDeadlock(Vec<String>),

    /// Wraps a tool-provider error that doesn't map cleanly onto one of
    /// the named kinds above.
    #[error(transparent)]
    Tool(#[from] lacquer_tool::ToolError),
}

impl From<lacquer_provider::ProviderError> for ExecError {
    fn from(err: lacquer_provider::ProviderError) -> Self {
        if err.is_retryable() {
            ExecError::ProviderTransient(err.to_string())
        } else {
            ExecError::ProviderPermanent(err.to_string())
        }
    }
}
