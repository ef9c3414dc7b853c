//! Completion request and response types

use crate::Message;
use serde::{Deserialize, Serialize};

/// Output cap used when the caller does not set one
pub const DEFAULT_MAX_TOKENS: usize = 1024;

/// One generation call: the conversation so far plus sampling settings
///
/// ```
/// use nexus_llm::{CompletionRequest, Message};
///
/// let request = CompletionRequest::new("gemini-2.5-flash")
///     .with_message(Message::user("Summarise TSMC in one line"))
///     .with_max_tokens(256);
/// assert_eq!(request.messages.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,

    /// Conversation turns, oldest first
    pub messages: Vec<Message>,

    /// System instruction sent alongside the conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub max_tokens: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Empty request for `model` with the default output cap
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// What the provider sent back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub message: Message,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

/// Why generation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model finished on its own
    EndTurn,

    /// Output hit `max_tokens`
    MaxTokens,

    /// Output was withheld by the provider's safety filters
    Safety,

    /// Anything the provider reports that has no variant here
    Other,
}

/// Token accounting reported by the provider; zero when it reports none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}
