//! The metric source contract and its fixed update protocol.
//!
//! Every collector implements [`MetricSource`]'s three steps. The order they
//! run in is owned by [`update`], which is a free function so implementations
//! cannot reorder or skip steps.

use serde::Serialize;

use crate::error::SourceError;
use crate::sink::LogSink;
use crate::sources::{
    CpuReading, DiskReading, MemoryReading, NetworkReading, ProcessReading, SystemReading,
};

/// A periodically sampled OS metric source.
pub trait MetricSource {
    /// Stable identifier used in diagnostics.
    fn name(&self) -> &'static str;

    /// Read the raw OS data for this tick.
    ///
    /// On failure the raw sample is left empty so the following parse
    /// produces no new data.
    fn acquire(&mut self) -> Result<(), SourceError>;

    /// Decode the raw sample into this tick's fields.
    ///
    /// Malformed records are skipped individually and returned in the
    /// report. An `Err` means the source as a whole could not be read.
    fn parse(&mut self) -> Result<ParseReport, SourceError>;

    /// Compute the externally visible reading from the parsed fields.
    fn derive(&mut self) {}

    /// Snapshot of the latest reading.
    fn reading(&self) -> Reading;
}

/// Records skipped while parsing one tick's raw sample.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub skipped: Vec<SourceError>,
}

impl ParseReport {
    /// Note a record that could not be decoded.
    pub fn skip(&mut self, error: SourceError) {
        self.skipped.push(error);
    }
}

/// Outcome of one [`update`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStatus {
    /// Acquire or parse failed; the reading is stale.
    pub failed: bool,
    /// Number of malformed records dropped this tick.
    pub skipped: usize,
}

/// Run one acquire → parse → derive cycle on `source`.
///
/// Failures are reported to `sink` and never propagate; parse and derive
/// still run after a failed acquire.
pub fn update<S>(source: &mut S, sink: &dyn LogSink) -> UpdateStatus
where
    S: MetricSource + ?Sized,
{
    let name = source.name();
    let mut status = UpdateStatus::default();

    if let Err(e) = source.acquire() {
        sink.source_failed(name, &e);
        status.failed = true;
    }

    match source.parse() {
        Ok(report) => {
            for skipped in &report.skipped {
                sink.record_skipped(name, skipped);
            }
            status.skipped = report.skipped.len();
        }
        Err(e) => {
            sink.source_failed(name, &e);
            status.failed = true;
        }
    }

    source.derive();

    status
}

/// Latest reading of one source, as consumed by renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Reading {
    System(SystemReading),
    Cpu(CpuReading),
    Memory(MemoryReading),
    Disk(DiskReading),
    Network(NetworkReading),
    Process(ProcessReading),
}
