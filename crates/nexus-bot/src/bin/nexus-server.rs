//! Nexus LINE webhook server
//!
//! # Usage
//!
//! ```bash
//! export LINE_CHANNEL_SECRET="..."
//! export LINE_CHANNEL_ACCESS_TOKEN="..."
//! export GEMINI_API_KEY="..."
//!
//! cargo run --bin nexus-server -p nexus-bot
//! ```
//!
//! Set `LOG_JSON=1` for JSON console logs and `LOG_DIR` for rolling files.

use nexus_bot::platforms::LineClient;
use nexus_bot::server::{self, AppState};
use nexus_bot::{BotConfig, CommandDispatcher};
use nexus_utils::{LogConfig, init_tracing_with};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guards = init_tracing_with(&LogConfig::from_env());

    let config = BotConfig::from_env()?;
    let line = config.line_config()?;
    let dispatcher = CommandDispatcher::from_config(&config)?;
    info!(
        app = %config.app_name,
        model = %config.gemini_model,
        commands = ?dispatcher.commands(),
        "Dispatcher ready"
    );

    let replier = LineClient::new(line)?;
    let channel_secret: Arc<str> = replier.channel_secret().into();
    let state = AppState::new(
        config.app_name.as_str(),
        channel_secret,
        Arc::new(dispatcher),
        Arc::new(replier),
    );

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!(%address, "Listening for LINE webhooks");

    server::serve(listener, server::router(state)).await?;

    info!("Server stopped");
    Ok(())
}
