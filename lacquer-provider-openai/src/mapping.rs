//! Bidirectional mapping between `lacquer_core`'s uniform model types and
//! OpenAI's Chat Completions wire format.
//!
//! Chat Completions has no multi-block message — an assistant turn is one
//! string plus a `tool_calls` array, and each tool result is its own
//! `role: "tool"` message — so this isn't a 1:1 per-`ModelMessage` mapping
//! like Anthropic's; `to_api_messages` flattens accordingly.

use crate::types::{OpenAiFunctionCall, OpenAiFunctionDef, OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiTool, OpenAiToolCall};
use lacquer_core::{concat_text, ContentBlock, ModelMessage, ModelRequest, Role, TokenUsage};
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
        tracing::warn!(kind, "openai adapter dropped a content block kind during round-tripping");
    }
}

/// The block kind name used in the dropped-block warning, matching the
/// content discriminator names `lacquer_core::ContentBlock` serializes as.
fn block_kind(block: &ContentBlock) -> &'static str {
    match block {
        ContentBlock::Text { .. } => "text",
        ContentBlock::Image { .. } => "image",
        ContentBlock::ToolUse { .. } => "tool_use",
        ContentBlock::ToolResult { .. } => "tool_result",
        ContentBlock::Thinking { .. } => "thinking",
        ContentBlock::Unknown => "unknown",
    }
}

pub(crate) fn to_api_request(request: &ModelRequest, default_model: &str, default_max_tokens: u32) -> OpenAiRequest {
    let model = if request.model.is_empty() { default_model.to_string() } else { request.model.clone() };
    let mut messages = Vec::new();
    if let Some(system) = &request.system_prompt {
        messages.push(OpenAiMessage { role: "system".to_string(), content: Some(system.clone()), tool_calls: vec![], tool_call_id: None });
    }
    messages.extend(to_api_messages(&request.messages));

    OpenAiRequest {
        model,
        messages,
        tools: request.tools.iter().map(|t| OpenAiTool {
            tool_type: "function".to_string(),
            function: OpenAiFunctionDef { name: t.name.clone(), description: t.description.clone(), parameters: t.parameters.clone() },
        }).collect(),
        max_tokens: request.sampling.max_tokens.unwrap_or(default_max_tokens),
        temperature: request.sampling.temperature,
        top_p: request.sampling.top_p,
        stop: request.sampling.stop.clone(),
    }
}

fn to_api_messages(messages: &[ModelMessage]) -> Vec<OpenAiMessage> {
    let mut out = Vec::new();
    for message in messages {
        match message.role {
            Role::Assistant => {
                let text = concat_text(&message.content);
                let tool_calls = message
                    .content
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolUse { id, name, input } => Some(OpenAiToolCall {
                            id: id.clone(),
                            call_type: "function".to_string(),
                            function: OpenAiFunctionCall { name: name.clone(), arguments: input.to_string() },
                        }),
                        _ => None,
                    })
                    .collect();
                for block in &message.content {
                    match block {
                        ContentBlock::Text { .. } | ContentBlock::ToolUse { .. } => {}
                        other => warn_dropped_once(block_kind(other)),
                    }
                }
                out.push(OpenAiMessage {
                    role: "assistant".to_string(),
                    content: if text.is_empty() { None } else { Some(text) },
                    tool_calls,
                    tool_call_id: None,
                });
            }
            Role::User => {
                let text = concat_text(&message.content);
                if !text.is_empty() {
                    out.push(OpenAiMessage { role: "user".to_string(), content: Some(text), tool_calls: vec![], tool_call_id: None });
                }
                for block in &message.content {
                    match block {
                        ContentBlock::ToolResult { tool_use_id, content, .. } => {
                            out.push(OpenAiMessage {
                                role: "tool".to_string(),
                                content: Some(content.clone()),
                                tool_calls: vec![],
                                tool_call_id: Some(tool_use_id.clone()),
                            });
                        }
                        ContentBlock::Text { .. } => {}
                        other => warn_dropped_once(block_kind(other)),
                    }
                }
            }
            Role::Tool => {
                for block in &message.content {
                    match block {
                        ContentBlock::ToolResult { tool_use_id, content, .. } => {
                            out.push(OpenAiMessage {
                                role: "tool".to_string(),
                                content: Some(content.clone()),
                                tool_calls: vec![],
                                tool_call_id: Some(tool_use_id.clone()),
                            });
                        }
                        other => warn_dropped_once(block_kind(other)),
                    }
                }
            }
        }
    }
    out
}

pub(crate) fn from_api_response(response: OpenAiResponse) -> Result<ModelResponse, String> {
    let choice = response.choices.into_iter().next().ok_or("response had no choices")?;
    let mut content = Vec::new();
    if let Some(text) = choice.message.content {
        if !text.is_empty() {
            content.push(ContentBlock::Text { text });
        }
    }
    for call in choice.message.tool_calls {
        let input = serde_json::from_str(&call.function.arguments).unwrap_or(serde_json::Value::Null);
        content.push(ContentBlock::ToolUse { id: call.id, name: call.function.name, input });
    }

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("tool_calls") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        Some("content_filter") => StopReason::ContentFilter,
        _ => StopReason::EndTurn,
    };

    Ok(ModelResponse {
        content,
        stop_reason,
        usage: TokenUsage {
            prompt_tokens: response.usage.prompt_tokens,
            completion_tokens: response.usage.completion_tokens,
            total_tokens: response.usage.total_tokens,
        },
        model: response.model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lacquer_core::SamplingParams;

    #[test]
    fn tool_result_becomes_its_own_tool_role_message() {
        let request = ModelRequest {
            model: String::new(),
            messages: vec![ModelMessage {
                role: Role::Tool,
                content: vec![ContentBlock::ToolResult { tool_use_id: "call_1".into(), content: "42".into(), is_error: false }],
            }],
            system_prompt: None,
            sampling: SamplingParams::default(),
            tools: vec![],
            request_id: "r1".into(),
            metadata: Default::default(),
        };
        let api = to_api_request(&request, "gpt-4.1", 4096);
        assert_eq!(api.messages[0].role, "tool");
        assert_eq!(api.messages[0].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn assistant_tool_use_becomes_a_function_tool_call() {
        let request = ModelRequest {
            model: String::new(),
            messages: vec![ModelMessage {
                role: Role::Assistant,
                content: vec![ContentBlock::ToolUse { id: "call_1".into(), name: "search".into(), input: serde_json::json!({"q": "rust"}) }],
            }],
            system_prompt: None,
            sampling: SamplingParams::default(),
            tools: vec![],
            request_id: "r1".into(),
            metadata: Default::default(),
        };
        let api = to_api_request(&request, "gpt-4.1", 4096);
        assert_eq!(api.messages[0].tool_calls[0].function.name, "search");
    }

    #[test]
    fn dropping_a_thinking_block_does_not_panic_and_keeps_the_text() {
        let request = ModelRequest {
            model: String::new(),
            messages: vec![ModelMessage {
                role: Role::Assistant,
                content: vec![
                    ContentBlock::Thinking { text: "reasoning".into(), signature: None },
                    ContentBlock::text("the answer"),
                ],
            }],
            system_prompt: None,
            sampling: SamplingParams::default(),
            tools: vec![],
            request_id: "r1".into(),
            metadata: Default::default(),
        };
        let api = to_api_request(&request, "gpt-4.1", 4096);
        assert_eq!(api.messages[0].content.as_deref(), Some("the answer"));
    }
}
