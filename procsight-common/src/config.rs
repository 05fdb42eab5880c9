//! JSON5 configuration loading and the logging section shared by every
//! procsight binary.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Encoding of diagnostic log lines on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// `logging` section of a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `"warn"` or `"procsight=debug"`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        // Quiet by default: stdout is the dashboard and stderr shares the tty.
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Read and decode a JSON5 file.
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read '{}': {}", path.display(), e)))?;

    json5::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config '{}': {}", path.display(), e)))
}

/// Decode a JSON5 document held in memory.
pub fn parse_config<T: DeserializeOwned>(content: &str) -> Result<T> {
    json5::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
}
