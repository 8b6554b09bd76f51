//! The NDJSON wire protocol spoken by the local CLI subprocess.
//!
//! Each line on the child's stdout is one JSON object tagged `type`:
//! `system` (session metadata, ignored beyond logging), `assistant`
//! (content blocks for one turn), or `result` (terminates the exchange
//! with aggregate duration/turn-count/usage).

use serde::Deserialize;
use std::collections::VecDeque;

use lacquer_core::ContentBlock;

/// One decoded NDJSON line.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum CliLine {
    /// Session-start metadata. Carried through to the progress sink only.
    System {
        #[serde(default)]
        subtype: Option<String>,
    },
    /// One assistant turn.
    Assistant { message: CliAssistantMessage },
    /// Terminates the exchange.
    Result {
        #[serde(default)]
        duration_ms: Option<u64>,
        #[serde(default)]
        num_turns: Option<u32>,
        #[serde(default)]
        is_error: Option<bool>,
        #[serde(default)]
        usage: Option<CliUsage>,
        #[serde(default)]
        result: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct CliAssistantMessage {
    pub content: Vec<CliContentBlock>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CliUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// A content block as the CLI emits it. Shaped like
/// [`lacquer_core::ContentBlock`] but `tool_use`/`tool_result` carry no
/// reliable shared id, hence the name-order pairing in [`pair_tool_calls`].
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum CliContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        #[serde(default)]
        content: serde_json::Value,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Unknown,
}

/// Reassemble one assistant turn's raw blocks into [`ContentBlock`]s,
/// pairing each `tool_result` with the oldest still-unmatched `tool_use`
/// in emission order (the CLI doesn't echo a shared id on the result
/// side, so order is the only linkage available).
pub(crate) fn pair_tool_calls(blocks: Vec<CliContentBlock>) -> Vec<ContentBlock> {
    let mut pending: VecDeque<(String, String)> = VecDeque::new();
    let mut out = Vec::with_capacity(blocks.len());

    for block in blocks {
        match block {
            CliContentBlock::Text { text } => out.push(ContentBlock::Text { text }),
            CliContentBlock::ToolUse { id, name, input } => {
                let id = id.unwrap_or_else(|| format!("cli-call-{}", pending.len() + out.len()));
                pending.push_back((id.clone(), name.clone()));
                out.push(ContentBlock::ToolUse { id, name, input });
            }
            CliContentBlock::ToolResult { content, is_error } => {
                let tool_use_id = pending.pop_front().map(|(id, _)| id).unwrap_or_default();
                let content = match content {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                out.push(ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                });
            }
            CliContentBlock::Unknown => out.push(ContentBlock::Unknown),
        }
    }

    out
}

/// Estimate token count from character count when the CLI's `result`
/// message omits `usage`: 4 characters per token.
pub(crate) fn estimate_tokens(char_count: usize) -> u64 {
    ((char_count as f64) / 4.0).ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_result_line() {
        let line = r#"{"type":"result","duration_ms":1200,"num_turns":2,"is_error":false,"result":"done"}"#;
        let parsed: CliLine = serde_json::from_str(line).unwrap();
        match parsed {
            CliLine::Result { duration_ms, num_turns, is_error, .. } => {
                assert_eq!(duration_ms, Some(1200));
                assert_eq!(num_turns, Some(2));
                assert_eq!(is_error, Some(false));
            }
            _ => panic!("expected a result line"),
        }
    }

    #[test]
    fn pairs_tool_use_and_result_by_order() {
        let blocks = vec![
            CliContentBlock::Text { text: "let me check".into() },
            CliContentBlock::ToolUse { id: None, name: "search".into(), input: serde_json::json!({"q": "rust"}) },
            CliContentBlock::ToolResult { content: serde_json::json!("42 results"), is_error: false },
        ];
        let out = pair_tool_calls(blocks);
        let ContentBlock::ToolUse { id, .. } = &out[1] else { panic!("expected tool_use") };
        let ContentBlock::ToolResult { tool_use_id, content, .. } = &out[2] else { panic!("expected tool_result") };
        assert_eq!(id, tool_use_id);
        assert_eq!(content, "42 results");
    }

    #[test]
    fn estimates_four_characters_per_token() {
        assert_eq!(estimate_tokens(8), 2);
        assert_eq!(estimate_tokens(9), 3);
    }
}
