//! Logging setup.
//!
//! There is no TUI here to garble, so logs go to stdout via
//! `tracing_subscriber::fmt`, with an optional rotating file appender
//! layered in when `LoggingConfig::file_enabled` is set.

use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// Returns the `WorkerGuard` for the file appender (if file logging is
/// enabled) - it must be kept alive for the lifetime of the process, or
/// buffered log lines are dropped on exit.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let default_filter = format!("healthsync={}", config.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    if config.file_enabled {
        let rotation = config.file_rotation.to_tracing_appender();
        let file_appender =
            tracing_appender::rolling::RollingFileAppender::new(rotation, &config.file_dir, &config.file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();

        None
    }
}
