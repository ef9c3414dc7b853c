//! Google Gemini provider implementation
//!
//! This module implements the LLMProvider trait for Gemini models through the
//! `generateContent` REST endpoint.
//! See: https://ai.google.dev/api/generate-content

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message, Result,
    Role, StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for [`GeminiProvider`]
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`
    pub api_key: String,
    /// Base URL without trailing slash
    pub api_base: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Config with the public endpoint and default timeout
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: GEMINI_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the endpoint base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Google Gemini provider
///
/// Works with any model exposed by `generateContent`, e.g.
/// - gemini-2.5-flash
/// - gemini-2.5-pro
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "Gemini API key is empty".to_string(),
            ));
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.config.api_base)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Gemini API");

        let url = self.endpoint(&request.model);
        let body = GeminiRequest::from(&request);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(request.model),
                code if status.is_server_error() => LLMError::ServerError {
                    status: code,
                    body: error_text,
                },
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let completion = gemini_response.into_completion();
        debug!(
            "Received response - stop_reason: {:?}, tokens: {}/{}",
            completion.stop_reason, completion.usage.input_tokens, completion.usage.output_tokens
        );

        Ok(completion)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// Gemini wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: String) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart { text: Some(text) }],
        }
    }
}

impl From<&CompletionRequest> for GeminiRequest {
    fn from(request: &CompletionRequest) -> Self {
        let contents = request
            .messages
            .iter()
            .map(|message| GeminiContent {
                role: Some(
                    match message.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: message
                    .content
                    .iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } => GeminiPart {
                            text: Some(text.clone()),
                        },
                    })
                    .collect(),
            })
            .collect();

        Self {
            contents,
            system_instruction: request
                .system
                .clone()
                .map(|system| GeminiContent::text(None, system)),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

impl GeminiResponse {
    /// Takes the first candidate; a response without candidates becomes an
    /// empty assistant message rather than an error.
    fn into_completion(self) -> CompletionResponse {
        let usage = self.usage_metadata.unwrap_or_default();
        let candidate = self.candidates.into_iter().next();

        let finish_reason = candidate
            .as_ref()
            .and_then(|c| c.finish_reason.clone())
            .unwrap_or_default();

        let content = candidate
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .map(|text| ContentBlock::Text { text })
                    .collect()
            })
            .unwrap_or_default();

        CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content,
            },
            stop_reason: match finish_reason.as_str() {
                "STOP" | "" => StopReason::EndTurn,
                "MAX_TOKENS" => StopReason::MaxTokens,
                "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" => StopReason::Safety,
                other => {
                    debug!("Unknown finish reason: {other}");
                    StopReason::Other
                }
            },
            usage: TokenUsage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
            },
        }
    }
}
