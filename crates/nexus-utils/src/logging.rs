//! Logging and tracing utilities

use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{LevelFilter, filter_fn};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Emit console logs as JSON lines instead of human-readable text
    pub json: bool,
    /// Directory for rolling log files; console only when `None`
    pub directory: Option<PathBuf>,
    /// File name prefix for rolling log files
    pub file_prefix: String,
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            json: false,
            directory: None,
            file_prefix: "nexus".to_string(),
            default_filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Create config from `LOG_JSON` and `LOG_DIR`
    pub fn from_env() -> Self {
        let env = crate::EnvReader::process();
        Self {
            json: env.flag("LOG_JSON"),
            directory: env.get("LOG_DIR").map(PathBuf::from),
            ..Default::default()
        }
    }
}

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    // Console-only setup never creates file guards.
    let _ = init_tracing_with(&LogConfig::default());
}

/// Initialize tracing from a [`LogConfig`]
///
/// With a log directory configured, two daily-rolling JSON files are written:
/// `{prefix}_info.log` receives everything below ERROR and `{prefix}_error.log`
/// receives ERROR only. The returned guards flush the background writers and
/// must be kept alive for the lifetime of the process.
pub fn init_tracing_with(config: &LogConfig) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.json {
        layers.push(fmt::layer().json().with_current_span(true).boxed());
    } else {
        layers.push(fmt::layer().boxed());
    }

    if let Some(dir) = &config.directory {
        let info_appender =
            tracing_appender::rolling::daily(dir, format!("{}_info.log", config.file_prefix));
        let (info_writer, info_guard) = tracing_appender::non_blocking(info_appender);
        guards.push(info_guard);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(info_writer)
                .with_filter(filter_fn(|meta| *meta.level() != Level::ERROR))
                .boxed(),
        );

        let error_appender =
            tracing_appender::rolling::daily(dir, format!("{}_error.log", config.file_prefix));
        let (error_writer, error_guard) = tracing_appender::non_blocking(error_appender);
        guards.push(error_guard);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(error_writer)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.default_filter)),
        )
        .init();

    guards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(!config.json);
        assert!(config.directory.is_none());
        assert_eq!(config.file_prefix, "nexus");
        assert_eq!(config.default_filter, "info");
    }
}
