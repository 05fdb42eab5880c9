//! Shared plumbing for the procsight monitor.
//!
//! - [`config`]: JSON5 loading and the `logging` section
//! - [`record`]: the per-tick envelope written by JSON output
//! - [`error`]: crate error type

pub mod config;
pub mod error;
pub mod record;

pub use config::{LogFormat, LoggingConfig, load_config, parse_config};
pub use error::{Error, Result};
pub use record::{TickRecord, current_timestamp_millis};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global `tracing` subscriber.
///
/// Output goes to stderr so it never interleaves with the dashboard on
/// stdout. `RUST_LOG`, when set, replaces `config.level`.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", config.level, e)))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    installed.map_err(|e| Error::Config(format!("Logging already initialized: {}", e)))
}
