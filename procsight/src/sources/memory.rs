//! Memory totals from `/proc/meminfo`.

use std::path::PathBuf;

use serde::Serialize;

use super::{ProcPaths, read_raw};
use crate::error::SourceError;
use crate::source::{MetricSource, ParseReport, Reading};

const NAME: &str = "memory";

/// Values read from `meminfo`, in KB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryFields {
    pub total_kb: u64,
    pub free_kb: u64,
    pub available_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
}

/// Update `fields` from `Key: value kB` lines.
///
/// Keys other than the five tracked ones are ignored. Fields whose line is
/// absent or unparseable keep their previous value.
pub fn parse_meminfo(text: &str, fields: &mut MemoryFields, report: &mut ParseReport) {
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let Some((key, rest)) = line.split_once(':') else {
            report.skip(SourceError::malformed(NAME, line, "missing ':'"));
            continue;
        };

        let slot = match key.trim() {
            "MemTotal" => &mut fields.total_kb,
            "MemFree" => &mut fields.free_kb,
            "MemAvailable" => &mut fields.available_kb,
            "Buffers" => &mut fields.buffers_kb,
            "Cached" => &mut fields.cached_kb,
            _ => continue,
        };

        match rest.split_whitespace().next().map(str::parse::<u64>) {
            Some(Ok(value)) => *slot = value,
            Some(Err(e)) => report.skip(SourceError::malformed(NAME, line, e.to_string())),
            None => report.skip(SourceError::malformed(NAME, line, "missing value")),
        }
    }
}

/// Memory usage reading, all sizes in KB.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryReading {
    pub total_kb: u64,
    pub free_kb: u64,
    pub available_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
    /// `total - available`.
    pub used_kb: u64,
    pub usage_percent: f64,
}

/// Collector for system memory.
pub struct MemorySource {
    path: PathBuf,
    raw: String,
    fields: MemoryFields,
    reading: MemoryReading,
}

impl MemorySource {
    pub fn new(paths: &ProcPaths) -> Self {
        Self {
            path: paths.meminfo(),
            raw: String::new(),
            fields: MemoryFields::default(),
            reading: MemoryReading::default(),
        }
    }

    pub fn current(&self) -> &MemoryReading {
        &self.reading
    }
}

impl MetricSource for MemorySource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn acquire(&mut self) -> Result<(), SourceError> {
        read_raw(&self.path, &mut self.raw)
    }

    fn parse(&mut self) -> Result<ParseReport, SourceError> {
        let mut report = ParseReport::default();
        parse_meminfo(&self.raw, &mut self.fields, &mut report);
        Ok(report)
    }

    fn derive(&mut self) {
        let fields = self.fields;
        let used_kb = fields.total_kb.saturating_sub(fields.available_kb);

        self.reading.total_kb = fields.total_kb;
        self.reading.free_kb = fields.free_kb;
        self.reading.available_kb = fields.available_kb;
        self.reading.buffers_kb = fields.buffers_kb;
        self.reading.cached_kb = fields.cached_kb;
        self.reading.used_kb = used_kb;

        if fields.total_kb > 0 {
            self.reading.usage_percent = 100.0 * used_kb as f64 / fields.total_kb as f64;
        }
    }

    fn reading(&self) -> Reading {
        Reading::Memory(self.reading.clone())
    }
}
