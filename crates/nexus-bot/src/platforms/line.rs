//! LINE Messaging API
//!
//! Covers the three pieces the webhook server needs: verifying the
//! `x-line-signature` header, reading webhook events and sending replies.
//! See: https://developers.line.biz/en/reference/messaging-api/

use crate::error::{BotError, Result};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, instrument};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook body signature
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Header LINE uses to identify a request for support
pub const LINE_REQUEST_ID_HEADER: &str = "x-line-request-id";

/// Longest text LINE accepts in one message
pub const MAX_TEXT_CHARS: usize = 5000;

/// LINE channel configuration
#[derive(Debug, Clone)]
pub struct LineConfig {
    /// Channel secret, the HMAC key for webhook signatures
    pub channel_secret: String,

    /// Long-lived channel access token for the reply API
    pub channel_access_token: String,

    /// API base URL without trailing slash
    pub api_base: String,

    /// Reply request timeout
    pub timeout: Duration,
}

/// Check `signature` (base64 HMAC-SHA256 of `body` keyed by the channel secret)
///
/// Comparison is constant-time. Malformed base64 is simply a mismatch.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = BASE64.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Signature LINE would send for `body`
pub fn sign(channel_secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|e| BotError::Config(format!("Invalid channel secret: {e}")))?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Webhook request body
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    /// Bot user ID the events are for
    #[serde(default)]
    pub destination: Option<String>,

    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One webhook event; only the fields needed for text replies are modelled
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub reply_token: Option<String>,

    #[serde(default)]
    pub message: Option<EventMessage>,

    #[serde(default)]
    pub source: Option<EventSource>,
}

/// Message attached to a `message` event
#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub text: Option<String>,
}

/// Who sent the event
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub user_id: Option<String>,
}

/// A text message that can be answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub reply_token: String,
    pub text: String,
    pub user_id: Option<String>,
}

impl WebhookPayload {
    /// Text message events that carry a reply token
    pub fn text_messages(&self) -> impl Iterator<Item = TextMessage> + '_ {
        self.events.iter().filter_map(|event| {
            if event.kind != "message" {
                return None;
            }
            let message = event.message.as_ref().filter(|m| m.kind == "text")?;
            Some(TextMessage {
                reply_token: event.reply_token.clone()?,
                text: message.text.clone()?,
                user_id: event.source.as_ref().and_then(|s| s.user_id.clone()),
            })
        })
    }
}

/// Sends a reply for a webhook event
#[async_trait]
pub trait MessageReplier: Send + Sync {
    /// Reply to the event identified by `reply_token` with `text`
    async fn reply(&self, reply_token: &str, text: &str) -> Result<()>;
}

/// LINE reply API client
pub struct LineClient {
    client: Client,
    config: LineConfig,
}

impl LineClient {
    /// Create a new LINE client
    pub fn new(config: LineConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Channel secret for signature checks
    pub fn channel_secret(&self) -> &str {
        &self.config.channel_secret
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<OutgoingMessage>,
}

#[derive(Debug, Serialize)]
struct OutgoingMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

/// Cut `text` to at most [`MAX_TEXT_CHARS`] characters
pub fn truncate_text(text: &str) -> String {
    text.chars().take(MAX_TEXT_CHARS).collect()
}

#[async_trait]
impl MessageReplier for LineClient {
    #[instrument(skip(self, reply_token, text), fields(chars = text.chars().count()))]
    async fn reply(&self, reply_token: &str, text: &str) -> Result<()> {
        let body = ReplyRequest {
            reply_token,
            messages: vec![OutgoingMessage {
                kind: "text",
                text: truncate_text(text),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v2/bot/message/reply", self.config.api_base))
            .bearer_auth(&self.config.channel_access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let request_id = response
            .headers()
            .get(LINE_REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BotError::external(format!(
                "LINE reply failed with HTTP {status} (request id {request_id}): {error_text}"
            )));
        }

        debug!(%status, request_id = %request_id, "Reply sent");
        Ok(())
    }
}
