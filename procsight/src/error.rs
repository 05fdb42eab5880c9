//! Error types for the collection pipeline.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by a metric source while sampling.
///
/// Both variants are contained to the source and tick that produced them;
/// they are reported through the [`LogSink`](crate::sink::LogSink) and never
/// stop the scheduler.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The OS data source could not be read (missing, permission denied).
    #[error("{path} unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single record could not be decoded and was skipped.
    #[error("skipped malformed {source_name} record {record:?}: {reason}")]
    Malformed {
        source_name: &'static str,
        record: String,
        reason: String,
    },
}

impl SourceError {
    /// Create an unavailable-source error for `path`.
    pub fn unavailable(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Unavailable {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a malformed-record error.
    pub fn malformed(
        source_name: &'static str,
        record: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Malformed {
            source_name,
            record: record.into(),
            reason: reason.into(),
        }
    }
}

/// Fatal errors setting up the sampling loop.
///
/// These are the only errors that abort the program.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The timer runtime could not be created.
    #[error("Failed to start timer runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Termination signal handlers could not be installed.
    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}
