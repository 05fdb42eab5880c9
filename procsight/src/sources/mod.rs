//! Concrete collectors, one per `/proc` data source.
//!
//! | Source    | File(s)                     |
//! |-----------|-----------------------------|
//! | system    | `uptime`, `loadavg`         |
//! | cpu       | `stat` (aggregate line)     |
//! | memory    | `meminfo`                   |
//! | disk      | `diskstats`                 |
//! | network   | `net/dev`                   |
//! | process   | `<pid>/stat` for every pid  |

mod cpu;
mod disk;
mod memory;
mod network;
mod process;
mod system;

use std::io;
use std::path::{Path, PathBuf};

use crate::error::SourceError;

pub use cpu::{CpuReading, CpuSource, CpuTimes};
pub use disk::{DiskReading, DiskSource, DiskStats, is_whole_disk, parse_diskstats};
pub use memory::{MemoryFields, MemoryReading, MemorySource, parse_meminfo};
pub use network::{InterfaceStats, NetworkReading, NetworkSource, parse_net_dev};
pub use process::{ProcessEntry, ProcessReading, ProcessSource, parse_stat_line};
pub use system::{SystemReading, SystemSource};

/// Locations of the pseudo-files read by the collectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcPaths {
    root: PathBuf,
}

impl ProcPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stat(&self) -> PathBuf {
        self.root.join("stat")
    }

    pub fn meminfo(&self) -> PathBuf {
        self.root.join("meminfo")
    }

    pub fn diskstats(&self) -> PathBuf {
        self.root.join("diskstats")
    }

    pub fn net_dev(&self) -> PathBuf {
        self.root.join("net").join("dev")
    }

    pub fn uptime(&self) -> PathBuf {
        self.root.join("uptime")
    }

    pub fn loadavg(&self) -> PathBuf {
        self.root.join("loadavg")
    }

    /// Status record of one process.
    pub fn process_stat(&self, pid: &str) -> PathBuf {
        self.root.join(pid).join("stat")
    }
}

impl Default for ProcPaths {
    fn default() -> Self {
        Self::new("/proc")
    }
}

/// Read a pseudo-file as text.
///
/// Invalid UTF-8 (process and interface names may hold arbitrary bytes)
/// is replaced with U+FFFD so a single odd name cannot fail the whole read.
fn read_lossy(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Replace `raw` with the contents of `path`.
///
/// On failure `raw` is cleared so the next parse sees no data.
fn read_raw(path: &Path, raw: &mut String) -> Result<(), SourceError> {
    match read_lossy(path) {
        Ok(content) => {
            *raw = content;
            Ok(())
        }
        Err(e) => {
            raw.clear();
            Err(SourceError::unavailable(path, e))
        }
    }
}
