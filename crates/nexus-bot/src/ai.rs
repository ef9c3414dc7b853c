//! Generative AI client used by the handlers

use crate::config::BotConfig;
use crate::error::Result;
use nexus_llm::providers::{GeminiConfig, GeminiProvider};
use nexus_llm::{CompletionRequest, LLMError, LLMProvider, Message};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Single-prompt text generation over an [`LLMProvider`]
pub struct AiClient {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

impl AiClient {
    /// Create a client with default sampling settings
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 2048,
            temperature: 0.7,
        }
    }

    /// Gemini-backed client from the bot configuration
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        let gemini = GeminiProvider::new(
            GeminiConfig::new(config.gemini_api_key.clone()).with_timeout(config.request_timeout),
        )
        .map_err(|e| crate::BotError::Config(e.to_string()))?;

        Ok(Self::new(Arc::new(gemini), config.gemini_model.clone())
            .with_max_tokens(config.ai_max_tokens)
            .with_temperature(config.ai_temperature))
    }

    /// Set the maximum tokens per response
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Model name sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate text for a single user prompt
    ///
    /// `Ok(None)` means the provider answered but produced no text.
    #[instrument(skip(self, prompt), fields(model = %self.model, provider = self.provider.name()))]
    pub async fn generate(&self, prompt: &str) -> nexus_llm::Result<Option<String>> {
        let request = CompletionRequest::new(self.model.as_str())
            .with_message(Message::user(prompt))
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response = self.provider.complete(request).await.inspect_err(|e| {
            warn!(error = %e, "AI request failed");
        })?;

        debug!(
            stop_reason = ?response.stop_reason,
            tokens = response.usage.total(),
            "AI response received"
        );
        Ok(response.message.text())
    }
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Whether a provider error means the usage quota is spent
///
/// Providers report this inconsistently, so the check looks for `quota` or
/// `exhausted` anywhere in the error text.
pub fn is_quota_error(err: &LLMError) -> bool {
    let text = err.to_string().to_lowercase();
    text.contains("quota") || text.contains("exhausted")
}
