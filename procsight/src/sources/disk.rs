//! Cumulative block device I/O counters from `/proc/diskstats`.
//!
//! Only whole physical disks are reported. Counters are absolute totals
//! since boot; no rates are derived.

use std::path::PathBuf;

use serde::Serialize;

use super::{ProcPaths, read_raw};
use crate::error::SourceError;
use crate::source::{MetricSource, ParseReport, Reading};

const NAME: &str = "disk";

/// Name fragments identifying physical disks.
const DISK_PREFIXES: [&str; 3] = ["sd", "vd", "nvme"];

/// Per-device cumulative I/O counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiskStats {
    pub name: String,
    pub reads_completed: u64,
    pub writes_completed: u64,
    pub sectors_read: u64,
    pub sectors_written: u64,
}

/// Whether `name` is a whole physical disk rather than a partition or a
/// virtual device.
///
/// `sd`/`vd` names ending in a digit are partitions. Any `nvme` name
/// containing a `p` is treated as a partition (`nvme0n1p1`); a device with
/// a `p` elsewhere in its name would be misclassified.
pub fn is_whole_disk(name: &str) -> bool {
    if name.contains("loop") || !DISK_PREFIXES.iter().any(|p| name.contains(p)) {
        return false;
    }

    if name.len() <= 2 {
        return true;
    }

    if name.contains("nvme") {
        !name.contains('p')
    } else {
        !name.ends_with(|c: char| c.is_ascii_digit())
    }
}

/// Parse `diskstats` rows into whole-disk counters.
///
/// Rows are `major minor name` followed by the kernel's I/O counters.
pub fn parse_diskstats(text: &str, report: &mut ParseReport) -> Vec<DiskStats> {
    let mut disks = Vec::new();

    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 3 {
            report.skip(SourceError::malformed(NAME, line, "missing device name"));
            continue;
        }

        let name = fields[2];
        if !is_whole_disk(name) {
            continue;
        }
        if fields.len() < 10 {
            report.skip(SourceError::malformed(
                NAME,
                line,
                format!("expected at least 10 fields, found {}", fields.len()),
            ));
            continue;
        }

        match parse_row(name, &fields) {
            Ok(stats) => disks.push(stats),
            Err(reason) => report.skip(SourceError::malformed(NAME, line, reason)),
        }
    }

    disks
}

fn parse_row(name: &str, fields: &[&str]) -> Result<DiskStats, String> {
    let counter = |idx: usize| -> Result<u64, String> {
        fields[idx]
            .parse()
            .map_err(|e| format!("invalid counter '{}': {}", fields[idx], e))
    };

    Ok(DiskStats {
        name: name.to_string(),
        reads_completed: counter(3)?,
        sectors_read: counter(5)?,
        writes_completed: counter(7)?,
        sectors_written: counter(9)?,
    })
}

/// Disk I/O reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiskReading {
    pub devices: Vec<DiskStats>,
}

/// Collector for block device counters.
pub struct DiskSource {
    path: PathBuf,
    raw: String,
    reading: DiskReading,
}

impl DiskSource {
    pub fn new(paths: &ProcPaths) -> Self {
        Self {
            path: paths.diskstats(),
            raw: String::new(),
            reading: DiskReading::default(),
        }
    }

    pub fn current(&self) -> &DiskReading {
        &self.reading
    }
}

impl MetricSource for DiskSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn acquire(&mut self) -> Result<(), SourceError> {
        read_raw(&self.path, &mut self.raw)
    }

    fn parse(&mut self) -> Result<ParseReport, SourceError> {
        let mut report = ParseReport::default();
        if self.raw.is_empty() {
            return Ok(report);
        }

        self.reading.devices = parse_diskstats(&self.raw, &mut report);
        Ok(report)
    }

    fn reading(&self) -> Reading {
        Reading::Disk(self.reading.clone())
    }
}
