//! The uniform model request/response data model shared by every provider.
//!
//! This is the shape every vendor adapter translates to and from. It lives
//! in `lacquer-core` (not `lacquer-provider`) so that `lacquer-context` can
//! reference `TokenUsage` in `StepResult` without depending on the provider
//! crate.

use crate::content::ContentBlock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A message from the human/caller side of the conversation.
    User,
    /// A message produced by the model.
    Assistant,
    /// A tool-result message fed back to the model.
    Tool,
}

/// One message in a `ModelRequest`'s conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMessage {
    /// Who sent this message.
    pub role: Role,
    /// The message's content blocks.
    pub content: Vec<ContentBlock>,
}

impl ModelMessage {
    /// Construct a user message from a single text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Construct an assistant message from a single text block.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::text(text)],
        }
    }
}

/// A JSON-Schema-shaped tool definition visible to a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name, as the model will reference it in `ToolUse` blocks.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// What backs this tool's execution.
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    /// JSON Schema describing the tool's input parameters.
    pub parameters: serde_json::Value,
}

/// Where a tool's execution is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    /// Executed by the script provider (go/python/bash/js).
    Script,
    /// Executed by an MCP server.
    Mcp,
    /// Implemented natively within the host process.
    Native,
}

/// Sampling/generation parameters shared by the uniform request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling parameter.
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Sequences that terminate generation early.
    #[serde(default)]
    pub stop: Vec<String>,
}

/// A uniform request to a model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Model identifier, provider-specific.
    pub model: String,
    /// Ordered conversation history.
    pub messages: Vec<ModelMessage>,
    /// System prompt, if any. Mapping onto vendor wire formats is the
    /// provider adapter's responsibility.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Sampling parameters, passed through unchanged by adapters.
    #[serde(default)]
    pub sampling: SamplingParams,
    /// Tools visible to the model for this request.
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    /// Correlates this request with logs/events. Not sent to the vendor.
    pub request_id: String,
    /// Free-form metadata, not sent to the vendor.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Token accounting for a single `Generate` call.
///
/// Estimated monetary cost is deliberately absent here: cost derivation
/// happens at the execution-summary boundary, not inside the provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u64,
    /// Tokens consumed by the completion.
    pub completion_tokens: u64,
    /// Total tokens consumed (usually, but not necessarily, the sum).
    pub total_tokens: u64,
}

impl std::ops::Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: Self) -> Self::Output {
        TokenUsage {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}
