//! `/chat <message>`

use super::CommandHandler;
use crate::ai::{AiClient, is_quota_error};
use crate::error::{BotError, Result};
use async_trait::async_trait;
use nexus_prompt::PromptEngine;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

const PROMPT_NAME: &str = "chat";

/// Free-form conversation with the AI model
pub struct ChatHandler {
    prompts: Arc<PromptEngine>,
    ai: Arc<AiClient>,
}

impl ChatHandler {
    pub fn new(prompts: Arc<PromptEngine>, ai: Arc<AiClient>) -> Self {
        Self { prompts, ai }
    }
}

#[async_trait]
impl CommandHandler for ChatHandler {
    #[instrument(skip(self, args), fields(chars = args.chars().count()))]
    async fn execute(&self, args: &str) -> Result<String> {
        if args.trim().is_empty() {
            return Err(BotError::service(
                "Please provide a message, e.g. /chat hello",
            ));
        }

        let prompt = self
            .prompts
            .render(PROMPT_NAME, &json!({ "message": args }))?;

        match self.ai.generate(&prompt).await {
            Ok(Some(reply)) => {
                info!(reply_chars = reply.chars().count(), "Chat reply generated");
                Ok(reply)
            }
            Ok(None) => Err(BotError::external("AI returned an empty response.")),
            Err(e) if is_quota_error(&e) => Err(BotError::external_with(
                "AI quota has been reached, please try again tomorrow.",
                e,
            )),
            Err(e) => Err(BotError::external_with(
                "AI is temporarily unavailable, please try again later.",
                e,
            )),
        }
    }

    fn name(&self) -> &'static str {
        "chat"
    }
}
