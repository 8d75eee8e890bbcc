//! Logging Infrastructure
//!
//! `RUST_LOG` wins over the configured level when set. Console output is always
//! on; `log_dir` adds a daily-rolling file next to it.

use std::path::Path;

use tracing::Subscriber;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional daily-rolling file output
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    build_subscriber(log_level, log_dir).init();
}

fn build_subscriber(
    log_level: Option<&str>,
    log_dir: Option<&str>,
) -> impl Subscriber + Send + Sync + 'static {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_layer = log_dir.and_then(file_appender).map(|appender| {
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(appender)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
}

fn file_appender(dir: &str) -> Option<RollingFileAppender> {
    let log_path = Path::new(dir);
    if let Err(e) = std::fs::create_dir_all(log_path) {
        eprintln!("Cannot create log directory {dir}: {e}, logging to stdout only");
        return None;
    }
    Some(tracing_appender::rolling::daily(log_path, "platter-server"))
}
