//! Nexus chat bot
//!
//! Receives LINE webhook events, turns the user's text into a command and
//! replies with the handler's output. Handlers can fetch market data from
//! Yahoo Finance, compute technical indicators and ask a generative model for
//! an analysis.
//!
//! # Architecture
//!
//! - **dispatcher**: parses `/command args`, routes to a handler and turns
//!   every outcome into a user-facing reply
//! - **handlers**: `/help`, `/chat`, `/price` and `/stock`
//! - **market**: quote and OHLCV history providers
//! - **indicators**: moving averages, RSI, MACD and Bollinger Bands
//! - **ai**: thin wrapper over an [`nexus_llm::LLMProvider`]
//! - **platforms**: LINE signature checks, webhook payloads and reply API
//! - **server**: axum webhook endpoint
//!
//! # Example
//!
//! ```ignore
//! use nexus_bot::{BotConfig, CommandDispatcher};
//!
//! let config = BotConfig::from_env()?;
//! let dispatcher = CommandDispatcher::from_config(&config)?;
//! let reply = dispatcher.dispatch("/price 2330").await;
//! ```

pub mod ai;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod indicators;
pub mod market;
pub mod platforms;
pub mod prompts;
pub mod server;

pub use ai::AiClient;
pub use config::{BotConfig, BotConfigBuilder};
pub use dispatcher::{CommandDispatcher, DispatcherBuilder, parse_command};
pub use error::{BotError, BoxError, Result};
pub use handlers::CommandHandler;
pub use indicators::{EnrichedSeries, IndicatorEngine, IndicatorSet};
pub use market::{Bar, MarketDataProvider, Quote, Series, YahooFinanceProvider};
