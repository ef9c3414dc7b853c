//! Message types for model conversations

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Model message
    Assistant,
}

/// Content block in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Ordered content blocks; may be empty when the model produced nothing
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Concatenated text of all blocks
    ///
    /// Returns `None` when the message carries no text or only whitespace.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_text_joins_blocks() {
        let msg = Message {
            role: Role::Assistant,
            content: vec![
                ContentBlock::Text {
                    text: "Hi ".to_string(),
                },
                ContentBlock::Text {
                    text: "there".to_string(),
                },
            ],
        };
        assert_eq!(msg.text().as_deref(), Some("Hi there"));
    }

    #[test]
    fn test_blank_text_is_none() {
        let empty = Message {
            role: Role::Assistant,
            content: vec![],
        };
        assert_eq!(empty.text(), None);
        assert_eq!(Message::assistant("  \n").text(), None);
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(Message::user("Test")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "Test");
    }
}
