//! Tracing subscriber setup.
//!
//! The level comes from `INITTREE_LOG` when set (full `EnvFilter` syntax),
//! otherwise from the settings, bumped to `debug` by `--verbose`.

use crate::config::LoggingSettings;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

/// Environment variable holding a filter directive that overrides settings.
pub const LOG_ENV: &str = "INITTREE_LOG";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Off,
    Stdout,
    Stderr,
    File(String),
}

impl LogOutput {
    /// `0`/`off`, `1`/`stdout`, `2`/`stderr`, anything else is a file name.
    pub fn parse(s: &str) -> Self {
        match s {
            "0" | "off" => LogOutput::Off,
            "1" | "stdout" => LogOutput::Stdout,
            "2" | "stderr" => LogOutput::Stderr,
            filename => LogOutput::File(filename.to_string()),
        }
    }
}

fn build_filter(settings: &LoggingSettings, verbose: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    let level = if verbose { "debug" } else { settings.level.as_str() };
    EnvFilter::try_new(level).with_context(|| format!("invalid log level: {}", level))
}

/// Install the global subscriber.
pub fn init_logging(settings: &LoggingSettings, verbose: bool) -> Result<()> {
    let output = LogOutput::parse(&settings.output);
    if output == LogOutput::Off {
        return Ok(());
    }
    let filter = build_filter(settings, verbose)?;

    match output {
        LogOutput::Off => {}
        LogOutput::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogOutput::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogOutput::File(filename) => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&filename)
                .with_context(|| format!("failed to open log file {}", filename))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
