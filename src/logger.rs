//! Logging setup for the library
//!
//! Uses the `tracing` crate with `tracing-subscriber` for formatting. The log
//! level is taken from the configuration and defaults to `info`. Messages are
//! written to stdout, and additionally to a log file when `paths.log` is set.

use anyhow::{Context, Result};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::routines::settings::Settings;

/// Install the global tracing subscriber
///
/// Safe to call more than once: if a subscriber is already installed the call
/// is a no-op, so repeated entrypoint invocations (e.g. from tests) do not
/// panic.
pub fn setup_log(settings: &Settings) -> Result<()> {
    let log_level = settings.config.log_level.to_lowercase();
    let env_filter = EnvFilter::new(&log_level);

    let subscriber = Registry::default().with(env_filter);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false)
        .with_timer(CompactTimestamp);

    let file_layer = match &settings.paths.log {
        Some(log_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(log_path)
                .with_context(|| format!("Failed to open log file {}", log_path))?;
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_timer(CompactTimestamp),
            )
        }
        None => None,
    };

    if subscriber.with(stdout_layer).with(file_layer).try_init().is_ok() {
        tracing::debug!("Logging is configured with level: {}", log_level);
    }
    Ok(())
}

#[derive(Clone)]
struct CompactTimestamp;

impl FormatTime for CompactTimestamp {
    fn format_time(
        &self,
        w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> Result<(), std::fmt::Error> {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S"))
    }
}
