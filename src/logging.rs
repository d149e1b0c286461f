//! Logging setup for the command line tool.
//!
//! Library code only emits `tracing` events; the binary installs a subscriber.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level when `RUST_LOG` is not set.
    pub level: Level,
    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            include_target: false,
        }
    }
}

impl LoggingConfig {
    /// Configuration for `--verbose` runs.
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_target: true,
        }
    }
}

/// Installs a stderr subscriber. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tabclean={}", config.level)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.include_target);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
