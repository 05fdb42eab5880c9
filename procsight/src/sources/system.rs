//! Uptime, load averages and task counts.

use std::path::PathBuf;

use serde::Serialize;

use super::{ProcPaths, read_raw};
use crate::error::SourceError;
use crate::source::{MetricSource, ParseReport, Reading};

const NAME: &str = "system";

/// System-wide reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemReading {
    pub uptime_secs: f64,
    pub load_1: f64,
    pub load_5: f64,
    pub load_15: f64,
    pub running_tasks: u32,
    pub total_tasks: u32,
}

/// Collector for `uptime` and `loadavg`.
pub struct SystemSource {
    uptime_path: PathBuf,
    loadavg_path: PathBuf,
    raw_uptime: String,
    raw_loadavg: String,
    reading: SystemReading,
}

impl SystemSource {
    pub fn new(paths: &ProcPaths) -> Self {
        Self {
            uptime_path: paths.uptime(),
            loadavg_path: paths.loadavg(),
            raw_uptime: String::new(),
            raw_loadavg: String::new(),
            reading: SystemReading::default(),
        }
    }

    pub fn current(&self) -> &SystemReading {
        &self.reading
    }

    /// `seconds idle_seconds`
    fn parse_uptime(&mut self, report: &mut ParseReport) {
        let line = self.raw_uptime.trim();
        if line.is_empty() {
            return;
        }

        match line.split_whitespace().next().map(str::parse::<f64>) {
            Some(Ok(secs)) => self.reading.uptime_secs = secs,
            Some(Err(e)) => report.skip(SourceError::malformed(NAME, line, e.to_string())),
            None => report.skip(SourceError::malformed(NAME, line, "missing uptime")),
        }
    }

    /// `load1 load5 load15 running/total lastpid`
    fn parse_loadavg(&mut self, report: &mut ParseReport) {
        let line = self.raw_loadavg.trim();
        if line.is_empty() {
            return;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();

        let loads: Result<Vec<f64>, _> = fields.iter().take(3).map(|f| f.parse::<f64>()).collect();
        match loads {
            Ok(loads) if loads.len() == 3 => {
                self.reading.load_1 = loads[0];
                self.reading.load_5 = loads[1];
                self.reading.load_15 = loads[2];
            }
            Ok(_) => report.skip(SourceError::malformed(NAME, line, "missing load averages")),
            Err(e) => report.skip(SourceError::malformed(NAME, line, e.to_string())),
        }

        let tasks: Option<(u32, u32)> = fields
            .get(3)
            .and_then(|f| f.split_once('/'))
            .and_then(|(running, total)| Some((running.parse().ok()?, total.parse().ok()?)));
        match tasks {
            Some((running, total)) => {
                self.reading.running_tasks = running;
                self.reading.total_tasks = total;
            }
            None => report.skip(SourceError::malformed(
                NAME,
                line,
                "expected running/total task counts",
            )),
        }
    }
}

impl MetricSource for SystemSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn acquire(&mut self) -> Result<(), SourceError> {
        // Read both files even if the first fails.
        let uptime = read_raw(&self.uptime_path, &mut self.raw_uptime);
        let loadavg = read_raw(&self.loadavg_path, &mut self.raw_loadavg);
        uptime.and(loadavg)
    }

    fn parse(&mut self) -> Result<ParseReport, SourceError> {
        let mut report = ParseReport::default();
        self.parse_uptime(&mut report);
        self.parse_loadavg(&mut report);
        Ok(report)
    }

    fn reading(&self) -> Reading {
        Reading::System(self.reading.clone())
    }
}
