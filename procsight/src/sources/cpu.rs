//! Aggregate CPU usage from the first line of `/proc/stat`.

use std::path::PathBuf;

use serde::Serialize;

use super::{ProcPaths, read_raw};
use crate::error::SourceError;
use crate::source::{MetricSource, ParseReport, Reading};

const NAME: &str = "cpu";

/// Cumulative CPU time counters, in jiffies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Parse an aggregate `cpu  user nice system idle ...` line.
    ///
    /// Kernels older than 2.6 omit iowait onwards; missing trailing
    /// counters read as zero.
    pub fn parse_line(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some(label) if label.starts_with("cpu") => {}
            Some(label) => return Err(format!("unexpected label '{}'", label)),
            None => return Err("empty line".to_string()),
        }

        let mut values = [0u64; 8];
        let mut count = 0;
        for (slot, part) in values.iter_mut().zip(parts) {
            *slot = part
                .parse()
                .map_err(|e| format!("invalid counter '{}': {}", part, e))?;
            count += 1;
        }
        if count < 4 {
            return Err(format!("expected at least 4 counters, found {}", count));
        }

        let [user, nice, system, idle, iowait, irq, softirq, steal] = values;
        Ok(Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
        })
    }

    /// Time spent idle, including waiting on I/O.
    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    /// Sum of all eight counters.
    pub fn total(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// Busy percentage between `prev` and `self`.
    ///
    /// Returns `None` when no time elapsed or a counter went backwards
    /// (counter reset, host reboot).
    pub fn usage_since(&self, prev: &CpuTimes) -> Option<f64> {
        let total_delta = self.total().checked_sub(prev.total())?;
        let idle_delta = self.idle_total().checked_sub(prev.idle_total())?;
        if total_delta == 0 {
            return None;
        }

        let busy = total_delta.saturating_sub(idle_delta);
        Some((100.0 * busy as f64 / total_delta as f64).clamp(0.0, 100.0))
    }
}

/// CPU usage reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CpuReading {
    /// Busy percentage over the last interval; `None` until two samples
    /// with a positive delta have been seen.
    pub usage_percent: Option<f64>,
}

/// Collector for aggregate CPU usage.
pub struct CpuSource {
    path: PathBuf,
    raw: String,
    current: Option<CpuTimes>,
    prev: Option<CpuTimes>,
    reading: CpuReading,
}

impl CpuSource {
    pub fn new(paths: &ProcPaths) -> Self {
        Self {
            path: paths.stat(),
            raw: String::new(),
            current: None,
            prev: None,
            reading: CpuReading::default(),
        }
    }

    pub fn current(&self) -> &CpuReading {
        &self.reading
    }
}

impl MetricSource for CpuSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn acquire(&mut self) -> Result<(), SourceError> {
        read_raw(&self.path, &mut self.raw)
    }

    fn parse(&mut self) -> Result<ParseReport, SourceError> {
        let mut report = ParseReport::default();

        let Some(line) = self.raw.lines().next() else {
            return Ok(report);
        };

        match CpuTimes::parse_line(line) {
            Ok(times) => self.current = Some(times),
            Err(reason) => report.skip(SourceError::malformed(NAME, line, reason)),
        }

        Ok(report)
    }

    fn derive(&mut self) {
        // Only a sample parsed this tick may move the reading.
        let Some(current) = self.current.take() else {
            return;
        };

        if let Some(usage) = self.prev.as_ref().and_then(|prev| current.usage_since(prev)) {
            self.reading.usage_percent = Some(usage);
        }

        self.prev = Some(current);
    }

    fn reading(&self) -> Reading {
        Reading::Cpu(self.reading.clone())
    }
}
