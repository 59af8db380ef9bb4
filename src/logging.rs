//! Tracing subscriber setup.
//!
//! Diagnostics go to stderr so command output on stdout (including
//! `cfeed feed --json`) stays machine-readable.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` overrides `logging.filter`.
///
/// Calling this more than once is an error from `tracing_subscriber`; it is
/// reported, not panicked on.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| anyhow!("invalid logging.filter '{}': {}", config.filter, e))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}
