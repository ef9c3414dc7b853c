//! Chat platform integrations

pub mod line;

pub use line::{LineClient, LineConfig, MessageReplier, WebhookPayload};
