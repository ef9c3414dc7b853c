//! LLM provider trait definition

use async_trait::async_trait;
use crate::{CompletionRequest, CompletionResponse, Result};

/// Trait for generative model providers
///
/// Implementations are shared behind `Arc` by every command handler, so they
/// must be safe for concurrent use and enforce their own request timeouts.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the model
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages and sampling parameters
    ///
    /// # Returns
    ///
    /// The completion response with the model's message and metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "gemini")
    fn name(&self) -> &str;
}
