//! The workflow AST as consumed by the runtime.
//!
//! Produced by a validated out-of-scope parser; the runtime never mutates
//! it during a run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A validated workflow, ready to execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow schema version. Required.
    pub version: String,
    /// Human-readable workflow name.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form workflow metadata, visible to templates as `workflow.*`.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Named agent configurations.
    #[serde(default)]
    pub agents: HashMap<String, Agent>,
    /// The workflow body: inputs schema, initial state, ordered steps.
    pub workflow: WorkflowBody,
}

/// The body of a workflow: its input contract, initial state, and steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowBody {
    /// JSON schema describing expected inputs (validated upstream).
    #[serde(default)]
    pub inputs: serde_json::Value,
    /// Initial values for the mutable `state` map.
    #[serde(default)]
    pub state: HashMap<String, serde_json::Value>,
    /// Ordered list of steps. Required, non-empty in practice.
    pub steps: Vec<Step>,
    /// Declared output template, evaluated after the run completes.
    #[serde(default)]
    pub outputs: HashMap<String, String>,
}

/// A named agent configuration: model + provider + default sampling + tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Provider name this agent dispatches through (e.g. `"anthropic"`).
    pub provider: String,
    /// Model identifier within that provider.
    pub model: String,
    /// Optional system prompt prepended to every request from this agent.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate. Defaults are provider-specific.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling parameter.
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Names of tools visible to this agent.
    #[serde(default)]
    pub tools: Vec<String>,
}

/// A single workflow node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier within the workflow.
    pub id: String,
    /// What kind of step this is and its kind-specific fields.
    #[serde(flatten)]
    pub kind: StepKind,
    /// Execute only if this template renders truthy.
    #[serde(default)]
    pub condition: Option<String>,
    /// Skip if this template renders truthy (checked before `condition`).
    #[serde(default)]
    pub skip_if: Option<String>,
    /// State keys to write on success, each a template evaluated against
    /// the post-execution context.
    #[serde(default)]
    pub updates: HashMap<String, String>,
    /// Per-step timeout in milliseconds, overriding the executor default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// The three step kinds recognized by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    /// Calls a named agent with a rendered prompt.
    Agent {
        /// Name of the agent to invoke (key into `Workflow::agents`).
        agent: String,
        /// Prompt template, rendered through the template engine.
        prompt: String,
    },
    /// Delegates to an externally-defined reusable block.
    Block {
        /// The block identifier, e.g. `"http/get"`.
        uses: String,
        /// Parameters passed to the block, values rendered as templates.
        #[serde(default)]
        with: HashMap<String, serde_json::Value>,
    },
    /// A built-in verb: `update_state` or `human_input`.
    Action {
        /// The action name.
        action: String,
        /// Action-specific parameters.
        #[serde(default)]
        with: HashMap<String, serde_json::Value>,
    },
}
