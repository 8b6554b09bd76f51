//! Content blocks that cross the model-provider boundary.
//!
//! A message's content is a list of [`ContentBlock`]s. Every block carries
//! exactly one discriminator (`type`); an unknown discriminator deserializes
//! into [`ContentBlock::Unknown`] rather than failing — vendor adapters are
//! the only place a variant is allowed to be silently dropped, and only
//! when translating *to* a vendor that lacks it (see `Thinking`).

use serde::{Deserialize, Serialize};

/// A single block of structured content in a model message.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Plain text block.
    #[serde(rename = "text")]
    Text {
        /// The text content.
        text: String,
    },

    /// Image content block.
    #[serde(rename = "image")]
    Image {
        /// The image source (base64 or URL).
        source: ImageSource,
        /// The MIME type of the image.
        media_type: String,
    },

    /// A tool-use request emitted by the model.
    #[serde(rename = "tool_use")]
    ToolUse {
        /// Unique identifier for this tool use, matched to its result.
        id: String,
        /// Name of the tool to invoke.
        name: String,
        /// Tool input parameters.
        input: serde_json::Value,
    },

    /// The result of executing a tool, fed back to the model.
    #[serde(rename = "tool_result")]
    ToolResult {
        /// The `tool_use` id this result corresponds to.
        tool_use_id: String,
        /// The result content, as text.
        content: String,
        /// Whether the tool execution errored.
        is_error: bool,
    },

    /// Extended-thinking content. Preserved where the vendor supports it;
    /// dropped (with a once-per-run diagnostic) on vendors that don't.
    #[serde(rename = "thinking")]
    Thinking {
        /// Vendor-issued signature over the thinking content, if any.
        signature: Option<String>,
        /// The thinking text itself.
        text: String,
    },

    /// Diagnostic catch-all for a discriminator this build doesn't know
    /// about. Never constructed by this crate's own encoders; exists so
    /// deserializing a forward-compatible payload doesn't panic.
    #[serde(other)]
    Unknown,
}

impl ContentBlock {
    /// Shorthand constructor for a text block.
    pub fn text(s: impl Into<String>) -> Self {
        ContentBlock::Text { text: s.into() }
    }

    /// The block's text, if it's a `Text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }

    /// True for `ToolUse` blocks.
    pub fn is_tool_use(&self) -> bool {
        matches!(self, ContentBlock::ToolUse { .. })
    }
}

/// Source for image content.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Base64-encoded image data.
    Base64 {
        /// The base64-encoded image data.
        data: String,
    },
    /// URL pointing to an image.
    Url {
        /// The URL of the image.
        url: String,
    },
}

/// Concatenate the text of every `Text` block in a slice, in order.
///
/// Used by the step executor to build a step's `response` once the tool
/// loop produces a turn with no further tool-use blocks.
pub fn concat_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(ContentBlock::as_text)
        .collect::<Vec<_>>()
        .join("")
}

/// Split a block list into (tool-use blocks, everything else), preserving
/// relative order within each partition. Grounds the agent tool-call loop's
/// "separate text content from tool-use blocks" step.
pub fn partition_tool_use(blocks: Vec<ContentBlock>) -> (Vec<ContentBlock>, Vec<ContentBlock>) {
    blocks.into_iter().partition(|b| b.is_tool_use())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_block_roundtrips() {
        let b = ContentBlock::text("hello");
        let json = serde_json::to_string(&b).unwrap();
        let back: ContentBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }

    #[test]
    fn unknown_discriminator_does_not_panic() {
        let json = r#"{"type":"future_modality","payload":{"x":1}}"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block, ContentBlock::Unknown);
    }

    #[test]
    fn concat_text_ignores_non_text_blocks() {
        let blocks = vec![
            ContentBlock::text("a"),
            ContentBlock::ToolUse {
                id: "1".into(),
                name: "search".into(),
                input: serde_json::json!({}),
            },
            ContentBlock::text("b"),
        ];
        assert_eq!(concat_text(&blocks), "ab");
    }

    #[test]
    fn partition_preserves_order() {
        let blocks = vec![
            ContentBlock::text("a"),
            ContentBlock::ToolUse {
                id: "1".into(),
                name: "t1".into(),
                input: serde_json::json!(null),
            },
            ContentBlock::ToolUse {
                id: "2".into(),
                name: "t2".into(),
                input: serde_json::json!(null),
            },
        ];
        let (tool_use, rest) = partition_tool_use(blocks);
        assert_eq!(tool_use.len(), 2);
        assert_eq!(rest.len(), 1);
    }
}
