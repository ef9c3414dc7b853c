//! `/help`

use super::CommandHandler;
use crate::error::Result;
use async_trait::async_trait;

const HELP_TEXT: &str = "\
📖 Nexus commands

/help
  Show this command reference.

/chat <message>
  Talk to the AI assistant.
  e.g. /chat What moves semiconductor stocks?

/price <symbol>
  Latest price, daily change and the last 5 sessions.
  e.g. /price 2330   /price AAPL

/stock <symbol> [strategy]
  AI technical analysis on daily, weekly and monthly charts.
  Strategy defaults to general.
  e.g. /stock 2330   /stock TSLA swing

Numeric codes are looked up on the Taiwan exchange (2330 → 2330.TW).";

/// Static command reference
#[derive(Debug, Default)]
pub struct HelpHandler;

impl HelpHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn execute(&self, _args: &str) -> Result<String> {
        Ok(HELP_TEXT.to_string())
    }

    fn name(&self) -> &'static str {
        "help"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_help_lists_every_command() {
        let text = HelpHandler::new().execute("").await.unwrap();
        for command in ["/help", "/chat", "/price", "/stock"] {
            assert!(text.contains(command), "missing {command}");
        }
    }

    #[tokio::test]
    async fn test_help_ignores_args() {
        let handler = HelpHandler::new();
        assert_eq!(
            handler.execute("anything at all").await.unwrap(),
            handler.execute("").await.unwrap()
        );
    }
}
