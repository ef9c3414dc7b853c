//! Command dispatch
//!
//! [`CommandDispatcher::dispatch`] is the single entry point for user text. It
//! never fails: every handler outcome, including a panic, is turned into the
//! reply text sent back to the user.

use crate::ai::AiClient;
use crate::config::BotConfig;
use crate::error::{BotError, Result, error_chain};
use crate::handlers::{ChatHandler, CommandHandler, HelpHandler, QuoteHandler, ReportHandler};
use crate::market::{MarketDataProvider, YahooFinanceClient, YahooFinanceProvider};
use futures::FutureExt;
use nexus_prompt::PromptEngine;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Prefix that marks text as a command
pub const COMMAND_MARKER: char = '/';

/// Reply prefix for text that is not a command
pub const ECHO_PREFIX: &str = "Nexus received: ";

/// Reply for every failure the user cannot act on
pub const GENERIC_ERROR_REPLY: &str =
    "❌ An unexpected error occurred. Please try again later or contact the administrator.";

const DEFAULT_HELP_TOKEN: &str = "/help";

/// Split command text into a lower-cased token and its arguments
///
/// Returns `None` when `text` does not start with `/`. The token is
/// everything up to the first whitespace; the whitespace run after it is
/// dropped and the rest is returned untouched.
///
/// ```
/// use nexus_bot::parse_command;
///
/// assert_eq!(parse_command("/PRICE 2330"), Some(("/price".to_string(), "2330")));
/// assert_eq!(parse_command("/chat   hi  there "), Some(("/chat".to_string(), "hi  there ")));
/// assert_eq!(parse_command("/help"), Some(("/help".to_string(), "")));
/// assert_eq!(parse_command("hello"), None);
/// ```
pub fn parse_command(text: &str) -> Option<(String, &str)> {
    if !text.starts_with(COMMAND_MARKER) {
        return None;
    }

    let (token, args) = match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim_start()),
        None => (text, ""),
    };
    Some((token.to_lowercase(), args))
}

/// Routes command text to registered handlers
pub struct CommandDispatcher {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    help_token: String,
}

impl CommandDispatcher {
    /// Start building a dispatcher
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Dispatcher with the standard command table
    ///
    /// | token    | handler          |
    /// |----------|------------------|
    /// | `/help`  | [`HelpHandler`]  |
    /// | `/chat`  | [`ChatHandler`]  |
    /// | `/price` | [`QuoteHandler`] |
    /// | `/stock` | [`ReportHandler`]|
    pub fn standard(
        provider: Arc<dyn MarketDataProvider>,
        prompts: Arc<PromptEngine>,
        ai: Arc<AiClient>,
    ) -> Result<Self> {
        Self::builder()
            .register("/help", Arc::new(HelpHandler::new()))
            .register("/chat", Arc::new(ChatHandler::new(prompts.clone(), ai.clone())))
            .register("/price", Arc::new(QuoteHandler::new(provider.clone())))
            .register("/stock", Arc::new(ReportHandler::new(provider, prompts, ai)))
            .build()
    }

    /// Standard dispatcher wired to Yahoo Finance and Gemini
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        let provider = YahooFinanceProvider::new(YahooFinanceClient::new(config.request_timeout)?);
        let prompts = crate::prompts::engine(config);
        let ai = AiClient::from_config(config)?;

        Self::standard(Arc::new(provider), Arc::new(prompts), Arc::new(ai))
    }

    /// Registered tokens, sorted
    pub fn commands(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }

    /// Produce the reply for `raw_text`
    pub async fn dispatch(&self, raw_text: &str) -> String {
        let Some((token, args)) = parse_command(raw_text) else {
            return format!("{ECHO_PREFIX}{raw_text}");
        };

        let Some(handler) = self.handlers.get(&token) else {
            info!(command = %token, "Unknown command");
            return format!(
                "Unknown command: {token}, type {} for info.",
                self.help_token
            );
        };

        info!(command = %token, handler = handler.name(), "Dispatching command");

        match AssertUnwindSafe(handler.execute(args)).catch_unwind().await {
            Ok(Ok(reply)) => reply,
            Ok(Err(BotError::Service { message, .. })) => {
                warn!(command = %token, %message, "Command rejected");
                format!("⚠️ {}", single_line(&message))
            }
            Ok(Err(err)) => {
                error!(
                    command = %token,
                    error = %err,
                    chain = %error_chain(&err),
                    "Command failed"
                );
                GENERIC_ERROR_REPLY.to_string()
            }
            Err(panic) => {
                error!(
                    command = %token,
                    panic = panic_message(panic.as_ref()),
                    "Command handler panicked"
                );
                GENERIC_ERROR_REPLY.to_string()
            }
        }
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("commands", &self.commands())
            .field("help_token", &self.help_token)
            .finish()
    }
}

fn single_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Builder for [`CommandDispatcher`]
pub struct DispatcherBuilder {
    handlers: Vec<(String, Arc<dyn CommandHandler>)>,
    help_token: String,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            help_token: DEFAULT_HELP_TOKEN.to_string(),
        }
    }
}

impl DispatcherBuilder {
    /// Register `handler` under `token` (e.g. `/price`); matching ignores case
    pub fn register(mut self, token: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        self.handlers.push((token.into().to_lowercase(), handler));
        self
    }

    /// Token named in the unknown-command reply; defaults to `/help`
    pub fn help_token(mut self, token: impl Into<String>) -> Self {
        self.help_token = token.into().to_lowercase();
        self
    }

    /// Build the dispatcher
    ///
    /// Fails on malformed or duplicate tokens and when the help token has no
    /// handler.
    pub fn build(self) -> Result<CommandDispatcher> {
        let mut handlers: HashMap<String, Arc<dyn CommandHandler>> = HashMap::new();

        for (token, handler) in self.handlers {
            if !token.starts_with(COMMAND_MARKER)
                || token.len() == 1
                || token.contains(char::is_whitespace)
            {
                return Err(BotError::Config(format!("Invalid command token '{token}'")));
            }
            if handlers.contains_key(&token) {
                return Err(BotError::Config(format!("Duplicate command token '{token}'")));
            }
            handlers.insert(token, handler);
        }

        if !handlers.contains_key(&self.help_token) {
            return Err(BotError::Config(format!(
                "Help token '{}' has no handler",
                self.help_token
            )));
        }

        Ok(CommandDispatcher {
            handlers,
            help_token: self.help_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::FakeLlm;
    use crate::handlers::testing::FakeMarket;
    use async_trait::async_trait;
    use nexus_prompt::MemoryStore;
    use std::sync::Mutex;

    /// Handler that records its args and returns a scripted outcome
    struct Scripted {
        outcome: fn() -> Result<String>,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(outcome: fn() -> Result<String>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CommandHandler for Scripted {
        async fn execute(&self, args: &str) -> Result<String> {
            self.seen.lock().unwrap().push(args.to_string());
            (self.outcome)()
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    struct Panicking;

    #[async_trait]
    impl CommandHandler for Panicking {
        async fn execute(&self, _args: &str) -> Result<String> {
            panic!("indicator buffer overflow");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn dispatcher_with(token: &str, handler: Arc<dyn CommandHandler>) -> CommandDispatcher {
        CommandDispatcher::builder()
            .register("/help", Arc::new(HelpHandler::new()))
            .register(token, handler)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/Price 2330"), Some(("/price".to_string(), "2330")));
        assert_eq!(
            parse_command("/stock\t2330  Swing "),
            Some(("/stock".to_string(), "2330  Swing "))
        );
        assert_eq!(parse_command("/chat\n\nmulti\nline"), Some(("/chat".to_string(), "multi\nline")));
        assert_eq!(parse_command("/"), Some(("/".to_string(), "")));
        assert_eq!(parse_command(" /help"), None);
        assert_eq!(parse_command(""), None);
    }

    #[tokio::test]
    async fn test_non_command_is_echoed() {
        let dispatcher = dispatcher_with("/x", Scripted::new(|| Ok(String::new())));
        assert_eq!(dispatcher.dispatch("hello").await, "Nexus received: hello");
        assert_eq!(dispatcher.dispatch("").await, "Nexus received: ");
        assert_eq!(dispatcher.dispatch("  /help").await, "Nexus received:   /help");
    }

    #[tokio::test]
    async fn test_token_case_and_args_verbatim() {
        let handler = Scripted::new(|| Ok("done".to_string()));
        let dispatcher = dispatcher_with("/echo", handler.clone());

        assert_eq!(dispatcher.dispatch("/ECHO  Keep  THIS ").await, "done");
        assert_eq!(dispatcher.dispatch("/Echo").await, "done");
        assert_eq!(
            handler.seen.lock().unwrap().clone(),
            vec!["Keep  THIS ".to_string(), String::new()]
        );
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let dispatcher = dispatcher_with("/x", Scripted::new(|| Ok(String::new())));
        assert_eq!(
            dispatcher.dispatch("/Foo bar").await,
            "Unknown command: /foo, type /help for info."
        );
    }

    #[tokio::test]
    async fn test_service_error_is_shown() {
        let dispatcher = dispatcher_with(
            "/x",
            Scripted::new(|| {
                Err(BotError::service_with(
                    "Data retrieval failed:\n  No quote data found for ZZZZ",
                    "upstream detail",
                ))
            }),
        );
        let reply = dispatcher.dispatch("/x").await;
        assert_eq!(reply, "⚠️ Data retrieval failed: No quote data found for ZZZZ");
        assert!(!reply.contains("upstream detail"));
    }

    #[tokio::test]
    async fn test_other_errors_are_generic() {
        let external = dispatcher_with(
            "/x",
            Scripted::new(|| Err(BotError::external_with("AI is down", "api key leaked?"))),
        );
        assert_eq!(external.dispatch("/x").await, GENERIC_ERROR_REPLY);

        let other = dispatcher_with("/x", Scripted::new(|| Err(BotError::Other("bug".to_string()))));
        assert_eq!(other.dispatch("/x").await, GENERIC_ERROR_REPLY);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let dispatcher = dispatcher_with("/boom", Arc::new(Panicking));
        assert_eq!(dispatcher.dispatch("/boom").await, GENERIC_ERROR_REPLY);
        // Still usable afterwards
        assert!(dispatcher.dispatch("/help").await.contains("/price"));
    }

    #[test]
    fn test_builder_rejects_bad_tables() {
        let ok = || Scripted::new(|| Ok(String::new()));

        let err = CommandDispatcher::builder()
            .register("/help", ok())
            .register("/HELP", ok())
            .build()
            .unwrap_err();
        assert!(matches!(err, BotError::Config(ref msg) if msg.contains("Duplicate")));

        let err = CommandDispatcher::builder()
            .register("price", ok())
            .build()
            .unwrap_err();
        assert!(matches!(err, BotError::Config(ref msg) if msg.contains("Invalid")));

        let err = CommandDispatcher::builder()
            .register("/price", ok())
            .build()
            .unwrap_err();
        assert!(matches!(err, BotError::Config(ref msg) if msg.contains("/help")));

        let dispatcher = CommandDispatcher::builder()
            .register("/menu", ok())
            .help_token("/menu")
            .build()
            .unwrap();
        assert_eq!(dispatcher.help_token, "/menu");
    }

    #[tokio::test]
    async fn test_standard_table() {
        let prompts = MemoryStore::new().with_document("chat", "latest", "{{ message }}");
        let dispatcher = CommandDispatcher::standard(
            Arc::new(FakeMarket::new(1.0, None, None)),
            Arc::new(PromptEngine::new(prompts)),
            Arc::new(AiClient::new(Arc::new(FakeLlm::reply("pong")), "m")),
        )
        .unwrap();

        assert_eq!(dispatcher.commands(), vec!["/chat", "/help", "/price", "/stock"]);
        assert_eq!(dispatcher.dispatch("/chat ping").await, "pong");
        assert!(dispatcher.dispatch("/price 2330").await.starts_with("【Quote】2330.TW"));

        for command in ["/chat", "/price", "/stock"] {
            let reply = dispatcher.dispatch(command).await;
            assert!(reply.starts_with("⚠️ "), "{command} -> {reply}");
        }
        assert!(!dispatcher.dispatch("/help").await.starts_with("⚠️"));
    }
}
