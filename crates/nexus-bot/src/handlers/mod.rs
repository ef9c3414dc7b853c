//! Command handlers
//!
//! Each handler serves one command. Handlers are stateless apart from the
//! shared clients they hold, so one instance serves every dispatch.

mod chat;
mod help;
mod quote;
mod report;

pub use chat::ChatHandler;
pub use help::HelpHandler;
pub use quote::QuoteHandler;
pub use report::ReportHandler;

use crate::error::{BotError, Result};
use async_trait::async_trait;

/// A command implementation
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command with everything after the command token
    ///
    /// Returns [`BotError::Service`] when `args` do not satisfy the command
    /// and [`BotError::ExternalApi`] when a dependency fails.
    async fn execute(&self, args: &str) -> Result<String>;

    /// Short handler name used in logs
    fn name(&self) -> &str;
}

/// Market data failures are the user's concern (unknown symbol, no data),
/// so they are reported as service errors with the provider's message.
pub(crate) fn data_retrieval_failed(err: BotError) -> BotError {
    let message = match &err {
        BotError::ExternalApi { message, .. } => format!("Data retrieval failed: {message}"),
        _ => return err,
    };
    BotError::service_with(message, err)
}

/// `1234567` → `1,234,567`
pub(crate) fn with_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
