//! Configuration for the bot
//!
//! Everything is read from the environment once, at start-up, by the
//! binaries. Library code receives an already validated [`BotConfig`].

use crate::error::{BotError, Result};
use crate::platforms::line::LineConfig;
use nexus_utils::EnvReader;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_APP_NAME: &str = "Nexus";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_LINE_API_BASE: &str = "https://api.line.me";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_AI_MAX_TOKENS: usize = 2048;
const DEFAULT_AI_TEMPERATURE: f32 = 0.7;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Application name reported by the health endpoint
    pub app_name: String,

    /// Address the webhook server binds to
    pub host: String,

    /// Port the webhook server listens on
    pub port: u16,

    /// LINE channel secret used to verify webhook signatures
    pub line_channel_secret: Option<String>,

    /// LINE channel access token used for replies
    pub line_channel_access_token: Option<String>,

    /// LINE Messaging API base URL
    pub line_api_base: String,

    /// Gemini API key
    pub gemini_api_key: String,

    /// Gemini model name
    pub gemini_model: String,

    /// Maximum tokens per AI response
    pub ai_max_tokens: usize,

    /// AI sampling temperature
    pub ai_temperature: f32,

    /// Directory of prompt documents; the compiled-in prompts are used when unset
    pub prompts_dir: Option<PathBuf>,

    /// Timeout applied to every outbound HTTP request
    pub request_timeout: Duration,
}

impl BotConfig {
    /// Create a new configuration builder
    pub fn builder() -> BotConfigBuilder {
        BotConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_reader(&EnvReader::process())
    }

    /// Load configuration from any key/value lookup
    pub fn from_reader<F>(env: &EnvReader<F>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder()
            .app_name(env.get_or("APP_NAME", DEFAULT_APP_NAME))
            .host(env.get_or("APP_HOST", DEFAULT_HOST))
            .line_api_base(env.get_or("LINE_API_BASE", DEFAULT_LINE_API_BASE))
            .gemini_model(env.get_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL));

        if let Some(port) = env.parse("APP_PORT")? {
            builder = builder.port(port);
        }
        if let Some(secret) = env.get("LINE_CHANNEL_SECRET") {
            builder = builder.line_channel_secret(secret);
        }
        if let Some(token) = env.get("LINE_CHANNEL_ACCESS_TOKEN") {
            builder = builder.line_channel_access_token(token);
        }
        if let Some(key) = env.get("GEMINI_API_KEY") {
            builder = builder.gemini_api_key(key);
        }
        if let Some(max_tokens) = env.parse("AI_MAX_TOKENS")? {
            builder = builder.ai_max_tokens(max_tokens);
        }
        if let Some(temperature) = env.parse("AI_TEMPERATURE")? {
            builder = builder.ai_temperature(temperature);
        }
        if let Some(dir) = env.get("PROMPTS_DIR") {
            builder = builder.prompts_dir(dir);
        }
        if let Some(secs) = env.parse("REQUEST_TIMEOUT_SECS")? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.gemini_api_key.trim().is_empty() {
            return Err(BotError::Config("GEMINI_API_KEY not set".to_string()));
        }

        if self.ai_max_tokens == 0 {
            return Err(BotError::Config(
                "AI_MAX_TOKENS must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.ai_temperature) {
            return Err(BotError::Config(format!(
                "AI_TEMPERATURE must be between 0.0 and 2.0, got {}",
                self.ai_temperature
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(BotError::Config(
                "REQUEST_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// LINE credentials; required by the webhook server only
    pub fn line_config(&self) -> Result<LineConfig> {
        let channel_secret = self
            .line_channel_secret
            .clone()
            .ok_or_else(|| BotError::Config("LINE_CHANNEL_SECRET not set".to_string()))?;
        let channel_access_token = self
            .line_channel_access_token
            .clone()
            .ok_or_else(|| BotError::Config("LINE_CHANNEL_ACCESS_TOKEN not set".to_string()))?;

        Ok(LineConfig {
            channel_secret,
            channel_access_token,
            api_base: self.line_api_base.trim_end_matches('/').to_string(),
            timeout: self.request_timeout,
        })
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for BotConfig
#[derive(Debug, Default)]
pub struct BotConfigBuilder {
    app_name: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    line_channel_secret: Option<String>,
    line_channel_access_token: Option<String>,
    line_api_base: Option<String>,
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    ai_max_tokens: Option<usize>,
    ai_temperature: Option<f32>,
    prompts_dir: Option<PathBuf>,
    request_timeout: Option<Duration>,
}

impl BotConfigBuilder {
    /// Set the application name
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the bind host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the listen port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the LINE channel secret
    pub fn line_channel_secret(mut self, secret: impl Into<String>) -> Self {
        self.line_channel_secret = Some(secret.into());
        self
    }

    /// Set the LINE channel access token
    pub fn line_channel_access_token(mut self, token: impl Into<String>) -> Self {
        self.line_channel_access_token = Some(token.into());
        self
    }

    /// Set the LINE API base URL
    pub fn line_api_base(mut self, base: impl Into<String>) -> Self {
        self.line_api_base = Some(base.into());
        self
    }

    /// Set the Gemini API key
    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// Set the Gemini model
    pub fn gemini_model(mut self, model: impl Into<String>) -> Self {
        self.gemini_model = Some(model.into());
        self
    }

    /// Set the maximum tokens per AI response
    pub fn ai_max_tokens(mut self, max_tokens: usize) -> Self {
        self.ai_max_tokens = Some(max_tokens);
        self
    }

    /// Set the AI temperature
    pub fn ai_temperature(mut self, temperature: f32) -> Self {
        self.ai_temperature = Some(temperature);
        self
    }

    /// Set the prompt directory
    pub fn prompts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompts_dir = Some(dir.into());
        self
    }

    /// Set the outbound request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<BotConfig> {
        let config = BotConfig {
            app_name: self.app_name.unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            line_channel_secret: self.line_channel_secret,
            line_channel_access_token: self.line_channel_access_token,
            line_api_base: self
                .line_api_base
                .unwrap_or_else(|| DEFAULT_LINE_API_BASE.to_string()),
            gemini_api_key: self.gemini_api_key.unwrap_or_default(),
            gemini_model: self
                .gemini_model
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            ai_max_tokens: self.ai_max_tokens.unwrap_or(DEFAULT_AI_MAX_TOKENS),
            ai_temperature: self.ai_temperature.unwrap_or(DEFAULT_AI_TEMPERATURE),
            prompts_dir: self.prompts_dir,
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        };

        config.validate()?;
        Ok(config)
    }
}
