//! Low-level protocol events and the tool invocations reconstructed from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of content block opened by a `block_start` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// A run of assistant text.
    Text,
    /// A structured tool invocation whose input arrives as JSON fragments.
    ToolUse,
    /// Any block kind this pipeline does not interpret (e.g. thinking).
    #[serde(other)]
    Other,
}

/// One event of a streamed LLM response.
///
/// `index` identifies one of several concurrently open content blocks.
/// Ordering within a response is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ProtocolEvent {
    /// Incremental assistant text.
    TextDelta { index: usize, text: String },

    /// A content block opened.
    BlockStart {
        index: usize,
        block_type: BlockType,
        #[serde(default)]
        block_id: String,
        #[serde(default)]
        tool_name: Option<String>,
    },

    /// A fragment of a tool block's JSON input.
    JsonDelta { index: usize, fragment: String },

    /// A content block closed.
    BlockStop { index: usize },

    /// Any event kind not listed above; ignored.
    #[serde(other)]
    Unknown,
}

impl ProtocolEvent {
    /// Shorthand for a `text_delta` event.
    pub fn text(index: usize, text: impl Into<String>) -> Self {
        Self::TextDelta { index, text: text.into() }
    }

    /// Shorthand for opening a tool-use block.
    pub fn tool_start(index: usize, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::BlockStart {
            index,
            block_type: BlockType::ToolUse,
            block_id: id.into(),
            tool_name: Some(name.into()),
        }
    }

    /// Shorthand for opening a text block.
    #[must_use]
    pub fn text_start(index: usize) -> Self {
        Self::BlockStart { index, block_type: BlockType::Text, block_id: String::new(), tool_name: None }
    }

    /// Shorthand for a `json_delta` event.
    pub fn json(index: usize, fragment: impl Into<String>) -> Self {
        Self::JsonDelta { index, fragment: fragment.into() }
    }

    /// Shorthand for a `block_stop` event.
    #[must_use]
    pub const fn stop(index: usize) -> Self {
        Self::BlockStop { index }
    }

    /// Block index the event refers to, if any.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::TextDelta { index, .. }
            | Self::BlockStart { index, .. }
            | Self::JsonDelta { index, .. }
            | Self::BlockStop { index } => Some(*index),
            Self::Unknown => None,
        }
    }
}

/// A completed, fully-parsed tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    /// Block id assigned by the LLM service; unique within a response.
    pub id: String,
    /// Tool name the LLM chose.
    pub name: String,
    /// Parsed input payload. An empty object when the JSON was malformed.
    pub input: Value,
    /// Parser message when the accumulated JSON could not be parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self { id: id.into(), name: name.into(), input, parse_error: None }
    }

    /// Whether the input had to be replaced by an empty object.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.parse_error.is_some()
    }
}
