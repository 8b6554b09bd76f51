//! Bidirectional mapping between `lacquer_core`'s uniform model types and
//! Anthropic's wire format.

use crate::types::{AnthropicBlock, AnthropicImageSource, AnthropicMessage, AnthropicRequest, AnthropicResponse, AnthropicTool};
use lacquer_core::{ContentBlock, ImageSource, ModelMessage, ModelRequest, Role, TokenUsage};
use lacquer_provider::{ModelResponse, StopReason};
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

/// Kinds of content block this adapter has already warned about dropping
/// during round-tripping, so a chatty workflow doesn't re-log the same
/// warning on every turn.
fn warned_kinds() -> &'static Mutex<HashSet<&'static str>> {
    static WARNED: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();
    WARNED.get_or_init(|| Mutex::new(HashSet::new()))
}

fn warn_dropped_once(kind: &'static str) {
    let mut seen = warned_kinds().lock().expect("warned-kinds lock poisoned");
    if seen.insert(kind) {
        tracing::warn!(kind, "anthropic adapter dropped a content block kind during round-tripping");
    }
}

pub(crate) fn to_api_request(request: &ModelRequest, default_model: &str, default_max_tokens: u32) -> AnthropicRequest {
    let model = if request.model.is_empty() { default_model.to_string() } else { request.model.clone() };
    AnthropicRequest {
        model,
        max_tokens: request.sampling.max_tokens.unwrap_or(default_max_tokens),
        messages: request.messages.iter().map(to_api_message).collect(),
        system: request.system_prompt.clone(),
        tools: request.tools.iter().map(|t| AnthropicTool {
            name: t.name.clone(),
            description: t.description.clone(),
            input_schema: t.parameters.clone(),
        }).collect(),
        temperature: request.sampling.temperature,
        top_p: request.sampling.top_p,
        stop_sequences: request.sampling.stop.clone(),
    }
}

fn to_api_message(message: &ModelMessage) -> AnthropicMessage {
    // Anthropic has no distinct "tool" role: tool results are user-role
    // messages containing tool_result blocks.
    let role = match message.role {
        Role::User | Role::Tool => "user",
        Role::Assistant => "assistant",
    };
    AnthropicMessage {
        role: role.to_string(),
        content: message.content.iter().map(block_to_api).collect(),
    }
}

fn block_to_api(block: &ContentBlock) -> AnthropicBlock {
    match block {
        ContentBlock::Text { text } => AnthropicBlock::Text { text: text.clone() },
        ContentBlock::Image { source, media_type } => AnthropicBlock::Image {
            source: match source {
                ImageSource::Base64 { data } => AnthropicImageSource::Base64 { media_type: media_type.clone(), data: data.clone() },
                ImageSource::Url { url } => AnthropicImageSource::Url { url: url.clone() },
            },
        },
        ContentBlock::ToolUse { id, name, input } => AnthropicBlock::ToolUse {
            id: id.clone(),
            name: name.clone(),
            input: input.clone(),
        },
        ContentBlock::ToolResult { tool_use_id, content, is_error } => AnthropicBlock::ToolResult {
            tool_use_id: tool_use_id.clone(),
            content: content.clone(),
            is_error: *is_error,
        },
        ContentBlock::Thinking { text, signature } => AnthropicBlock::Thinking { thinking: text.clone(), signature: signature.clone() },
        ContentBlock::Unknown => {
            warn_dropped_once("unknown");
            AnthropicBlock::Text { text: String::new() }
        }
    }
}

pub(crate) fn from_api_response(response: AnthropicResponse) -> ModelResponse {
    let content = response.content.into_iter().map(block_from_api).collect();
    let stop_reason = match response.stop_reason.as_deref() {
        Some("tool_use") => StopReason::ToolUse,
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") | Some("end_turn") | None => StopReason::EndTurn,
        Some(_) => StopReason::EndTurn,
    };
    ModelResponse {
        content,
        stop_reason,
        usage: TokenUsage {
            prompt_tokens: response.usage.input_tokens,
            completion_tokens: response.usage.output_tokens,
            total_tokens: response.usage.input_tokens + response.usage.output_tokens,
        },
        model: response.model,
    }
}

fn block_from_api(block: AnthropicBlock) -> ContentBlock {
    match block {
        AnthropicBlock::Text { text } => ContentBlock::Text { text },
        AnthropicBlock::Image { source } => ContentBlock::Image {
            source: match source {
                AnthropicImageSource::Base64 { data, .. } => ImageSource::Base64 { data },
                AnthropicImageSource::Url { url } => ImageSource::Url { url },
            },
            media_type: "image/png".to_string(),
        },
        AnthropicBlock::ToolUse { id, name, input } => ContentBlock::ToolUse { id, name, input },
        AnthropicBlock::ToolResult { tool_use_id, content, is_error } => {
            ContentBlock::ToolResult { tool_use_id, content, is_error }
        }
        AnthropicBlock::Thinking { thinking, signature } => ContentBlock::Thinking { text: thinking, signature },
        AnthropicBlock::Unknown => {
            warn_dropped_once("unknown");
            ContentBlock::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lacquer_core::SamplingParams;

    #[test]
    fn thinking_blocks_round_trip_with_their_signature_intact() {
        let block = ContentBlock::Thinking { text: "let me work through this".into(), signature: Some("sig-123".into()) };
        let wire = block_to_api(&block);
        assert!(matches!(&wire, AnthropicBlock::Thinking { thinking, signature } if thinking == "let me work through this" && signature.as_deref() == Some("sig-123")));
        let back = block_from_api(wire);
        assert!(matches!(back, ContentBlock::Thinking { text, signature } if text == "let me work through this" && signature.as_deref() == Some("sig-123")));
    }

    #[test]
    fn maps_tool_role_messages_to_anthropic_user_role() {
        let request = ModelRequest {
            model: String::new(),
            messages: vec![ModelMessage { role: Role::Tool, content: vec![ContentBlock::text("ok")] }],
            system_prompt: None,
            sampling: SamplingParams::default(),
            tools: vec![],
            request_id: "r1".into(),
            metadata: Default::default(),
        };
        let api_request = to_api_request(&request, "claude-sonnet-4-5", 4096);
        assert_eq!(api_request.messages[0].role, "user");
    }

    #[test]
    fn falls_back_to_default_model_when_request_model_is_empty() {
        let request = ModelRequest {
            model: String::new(),
            messages: vec![],
            system_prompt: None,
            sampling: SamplingParams::default(),
            tools: vec![],
            request_id: "r1".into(),
            metadata: Default::default(),
        };
        assert_eq!(to_api_request(&request, "claude-haiku-4-5", 4096).model, "claude-haiku-4-5");
    }
}
