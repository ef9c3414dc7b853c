//! Error types for bot operations
//!
//! Handlers signal two kinds of expected failure:
//!
//! - [`BotError::Service`]: the request itself cannot be served (bad input,
//!   missing data). Its message is shown to the user.
//! - [`BotError::ExternalApi`]: a dependency (market data, AI) failed.
//!
//! Every other variant is unexpected. The dispatcher replaces unexpected and
//! `ExternalApi` errors with a generic reply and only logs the details.

use nexus_prompt::PromptError;
use nexus_utils::EnvError;
use std::error::Error as StdError;
use thiserror::Error;

/// Boxed cause carried by [`BotError::Service`] and [`BotError::ExternalApi`]
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type alias for bot operations
pub type Result<T> = std::result::Result<T, BotError>;

/// Bot specific errors
#[derive(Debug, Error)]
pub enum BotError {
    /// The request cannot be served; the message is user-facing
    #[error("{message}")]
    Service {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A downstream service failed
    #[error("{message}")]
    ExternalApi {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Prompt lookup or rendering failed
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl BotError {
    /// Service error without a cause
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            source: None,
        }
    }

    /// Service error wrapping `cause`
    pub fn service_with(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Service {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// External API error without a cause
    pub fn external(message: impl Into<String>) -> Self {
        Self::ExternalApi {
            message: message.into(),
            source: None,
        }
    }

    /// External API error wrapping `cause`
    pub fn external_with(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::ExternalApi {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// Check if this is a user-facing service error
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service { .. })
    }

    /// Check if this is an external API error
    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalApi { .. })
    }
}

impl From<EnvError> for BotError {
    fn from(err: EnvError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Render an error and its causes as `outer: cause: root`
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }
    rendered
}
