//! Message types for LLM communication
//!
//! A conversation is a list of role-tagged messages. Assistant replies may
//! carry tool calls next to (or instead of) text; structured output relies on
//! those tool calls.

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// System message (sent as the leading message by chat-style providers)
    System,
}

/// Content block in an assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },

    /// Tool call requested by the assistant
    ToolUse {
        /// Provider-assigned call id
        id: String,
        /// Tool name
        name: String,
        /// Parsed arguments
        input: serde_json::Value,
    },
}

/// Message content: either simple text or structured blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create a system message with text
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message that only carries a tool call
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolUse {
                id: id.into(),
                name: name.into(),
                input,
            }])),
        }
    }

    /// Extract text content from the message
    ///
    /// For block content, all text blocks are joined in order.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            Some(MessageContent::Text(s)) => Some(s.clone()),
            Some(MessageContent::Blocks(blocks)) => {
                let parts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        ContentBlock::ToolUse { .. } => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.concat())
                }
            }
            None => None,
        }
    }

    /// Arguments of the first tool call with the given name
    pub fn tool_input(&self, tool_name: &str) -> Option<&serde_json::Value> {
        match &self.content {
            Some(MessageContent::Blocks(blocks)) => blocks.iter().find_map(|b| match b {
                ContentBlock::ToolUse { name, input, .. } if name == tool_name => Some(input),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Check if this message contains any tool calls
    pub fn has_tool_uses(&self) -> bool {
        matches!(
            &self.content,
            Some(MessageContent::Blocks(blocks))
                if blocks.iter().any(|b| matches!(b, ContentBlock::ToolUse { .. }))
        )
    }
}
