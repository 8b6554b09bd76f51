//! Provider-facing types layered on top of `lacquer_core`'s uniform
//! `ModelRequest`/`ContentBlock`/`TokenUsage`.

use lacquer_core::{ContentBlock, TokenUsage};
use serde::{Deserialize, Serialize};

/// Why a provider stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model produced a final response.
    EndTurn,
    /// The model wants to invoke one or more tools.
    ToolUse,
    /// Generation stopped because `max_tokens` was reached.
    MaxTokens,
    /// Content was filtered by the vendor's safety layer.
    ContentFilter,
}

/// The uniform response from a single `Generate` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Response content blocks, in the order the model produced them.
    pub content: Vec<ContentBlock>,
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Token accounting for this call.
    pub usage: TokenUsage,
    /// The model actually used to serve the request (may differ from the
    /// requested alias, e.g. a `-latest` tag resolving to a dated model).
    pub model: String,
}

/// One entry in a provider's model catalog, as returned by `ListModels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// The model identifier used in `ModelRequest::model`.
    pub id: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Maximum context window in tokens, if published by the vendor.
    #[serde(default)]
    pub context_window: Option<u32>,
}
