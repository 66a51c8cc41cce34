//! Tracing initialization.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

const LOG_ENV: &str = "CLOUD_CARBON_LOG";

/// Reads `CLOUD_CARBON_LOG` for per-target levels, e.g.
/// `CLOUD_CARBON_LOG=cloud_carbon_monitor=debug`. Without it, `info` is used
/// for both crates, or `debug` when `verbose` is set.
///
/// With `log_file` set, output goes there instead of stderr so the terminal
/// dashboard is not overwritten.
pub fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let writer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    INIT.call_once(|| {
        let level = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
            EnvFilter::new(format!("cloud_carbon={level},cloud_carbon_monitor={level}"))
        });

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(log_file.is_none()),
            )
            .with(filter)
            .init();
    });

    Ok(())
}
