//! Generative AI provider abstraction for the Nexus bot
//!
//! This crate provides provider-agnostic abstractions for talking to
//! generative models. It includes:
//!
//! - Message types for model conversations
//! - Completion request/response types
//! - Provider trait for model implementations
//! - Concrete provider implementations (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "gemini")]
pub mod providers;
