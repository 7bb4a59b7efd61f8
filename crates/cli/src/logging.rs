//! Tracing subscriber setup
//!
//! - `RUST_LOG` overrides the default `hostkeeper=info` filter
//! - `HOSTKEEPER_LOG_FORMAT=json` switches stderr output to JSON lines
//! - `HOSTKEEPER_LOG_DIR=/var/log/hostkeeper` adds a daily rolling JSON file

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::expand_path;

const DEFAULT_FILTER: &str = "hostkeeper=info";
const LOG_FORMAT_ENV: &str = "HOSTKEEPER_LOG_FORMAT";
const LOG_DIR_ENV: &str = "HOSTKEEPER_LOG_DIR";
const LOG_FILE_PREFIX: &str = "hostkeeper.log";

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// whole process.
pub fn init() -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(expand_path(&dir), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(file_layer);

    // stdout is reserved for reports
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());
    match log_format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
