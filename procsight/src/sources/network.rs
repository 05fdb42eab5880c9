//! Per-interface traffic counters from `/proc/net/dev`.

use std::path::PathBuf;

use serde::Serialize;

use super::{ProcPaths, read_raw};
use crate::error::SourceError;
use crate::source::{MetricSource, ParseReport, Reading};

const NAME: &str = "network";

/// Lines of column headings preceding the interface rows.
const HEADER_LINES: usize = 2;

/// Cumulative traffic counters of one interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceStats {
    pub name: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
}

impl InterfaceStats {
    /// Parse an `iface: rx_bytes rx_packets ... tx_bytes tx_packets ...` row.
    pub fn parse_line(line: &str) -> Result<Self, String> {
        let (name, counters) = line
            .split_once(':')
            .ok_or_else(|| "missing ':' after interface name".to_string())?;

        let name = name.trim();
        if name.is_empty() {
            return Err("empty interface name".to_string());
        }

        // Receive: bytes packets errs drop fifo frame compressed multicast,
        // then transmit: bytes packets ...
        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() < 10 {
            return Err(format!(
                "expected at least 10 counters, found {}",
                fields.len()
            ));
        }

        let counter = |idx: usize| -> Result<u64, String> {
            fields[idx]
                .parse()
                .map_err(|e| format!("invalid counter '{}': {}", fields[idx], e))
        };

        Ok(Self {
            name: name.to_string(),
            rx_bytes: counter(0)?,
            rx_packets: counter(1)?,
            tx_bytes: counter(8)?,
            tx_packets: counter(9)?,
        })
    }
}

/// Parse `net/dev`, ignoring the first two lines whatever they contain.
pub fn parse_net_dev(text: &str, report: &mut ParseReport) -> Vec<InterfaceStats> {
    let mut interfaces = Vec::new();

    for line in text.lines().skip(HEADER_LINES) {
        if line.trim().is_empty() {
            continue;
        }

        match InterfaceStats::parse_line(line) {
            Ok(stats) => interfaces.push(stats),
            Err(reason) => report.skip(SourceError::malformed(NAME, line, reason)),
        }
    }

    interfaces
}

/// Network interface reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkReading {
    pub interfaces: Vec<InterfaceStats>,
}

/// Collector for network interface counters.
pub struct NetworkSource {
    path: PathBuf,
    raw: String,
    reading: NetworkReading,
}

impl NetworkSource {
    pub fn new(paths: &ProcPaths) -> Self {
        Self {
            path: paths.net_dev(),
            raw: String::new(),
            reading: NetworkReading::default(),
        }
    }

    pub fn current(&self) -> &NetworkReading {
        &self.reading
    }
}

impl MetricSource for NetworkSource {
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

        self.reading.interfaces = parse_net_dev(&self.raw, &mut report);
        Ok(report)
    }

    fn reading(&self) -> Reading {
        Reading::Network(self.reading.clone())
    }
}
