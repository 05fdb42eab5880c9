//! Configuration for the monitor.

use std::path::{Path, PathBuf};

use procsight_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::args::CliArgs;

/// File name looked up under the user's config directory.
pub const CONFIG_FILE_NAME: &str = "procsight.json5";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error(transparent)]
    Load(#[from] procsight_common::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete monitor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcsightConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sampling and presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Root of the proc filesystem (default: "/proc").
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,

    /// Which sources to sample.
    #[serde(default)]
    pub collect: CollectConfig,

    /// Number of processes listed by the dashboard (default: 5).
    #[serde(default = "default_top_processes")]
    pub top_processes: usize,

    #[serde(default)]
    pub output: OutputFormat,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            proc_root: default_proc_root(),
            collect: CollectConfig::default(),
            top_processes: default_top_processes(),
            output: OutputFormat::default(),
        }
    }
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_top_processes() -> usize {
    5
}

fn default_true() -> bool {
    true
}

/// Configuration for which sources to sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Uptime, load averages, task counts.
    #[serde(default = "default_true")]
    pub system: bool,

    /// Aggregate CPU usage.
    #[serde(default = "default_true")]
    pub cpu: bool,

    #[serde(default = "default_true")]
    pub memory: bool,

    /// Whole-disk I/O counters.
    #[serde(default = "default_true")]
    pub disk: bool,

    /// Per-interface traffic counters.
    #[serde(default = "default_true")]
    pub network: bool,

    /// Process table scan. Cost grows with the number of processes.
    #[serde(default = "default_true")]
    pub processes: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            system: true,
            cpu: true,
            memory: true,
            disk: true,
            network: true,
            processes: true,
        }
    }
}

impl CollectConfig {
    fn any_enabled(&self) -> bool {
        self.system || self.cpu || self.memory || self.disk || self.network || self.processes
    }
}

/// How each tick is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Full-screen terminal dashboard.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl ProcsightConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: ProcsightConfig = procsight_common::load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ProcsightConfig = procsight_common::parse_config(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Locate and load the configuration.
    ///
    /// An explicit path must exist. Without one, the default location under
    /// the user's config directory is tried, falling back to built-in
    /// defaults when nothing is there.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::load_from_file(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides and re-validate.
    pub fn apply_args(&mut self, args: &CliArgs) -> Result<(), ConfigError> {
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if let Some(root) = &args.proc_root {
            self.monitor.proc_root = root.clone();
        }
        if args.json {
            self.monitor.output = OutputFormat::Json;
        }
        if let Some(top) = args.top {
            self.monitor.top_processes = top;
        }
        self.validate()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let monitor = &self.monitor;

        if !monitor.collect.any_enabled() {
            return Err(ConfigError::Validation(
                "At least one source must be enabled".to_string(),
            ));
        }

        if monitor.top_processes == 0 {
            return Err(ConfigError::Validation(
                "top_processes must be > 0".to_string(),
            ));
        }

        if monitor.proc_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "proc_root must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// `<config_dir>/procsight/procsight.json5`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("procsight").join(CONFIG_FILE_NAME))
}
