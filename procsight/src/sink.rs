//! Log sinks receiving per-source failure notices.

use std::cell::RefCell;

use tracing::{debug, trace, warn};

use crate::error::SourceError;
use crate::scheduler::TickSummary;

/// Destination for diagnostics produced while sampling.
///
/// The scheduler owns one sink for the lifetime of the program and hands it
/// to every [`update`](crate::source::update) call.
pub trait LogSink {
    /// A source could not be read this tick; its reading is stale.
    fn source_failed(&self, source: &str, error: &SourceError);

    /// A single record was malformed and dropped.
    fn record_skipped(&self, source: &str, error: &SourceError);

    /// All sources have been updated for one tick.
    fn tick_completed(&self, _summary: &TickSummary) {}
}

/// Sink forwarding to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn source_failed(&self, source: &str, error: &SourceError) {
        warn!(source, error = %error, "Metric source failed");
    }

    fn record_skipped(&self, source: &str, error: &SourceError) {
        debug!(source, error = %error, "Skipped record");
    }

    fn tick_completed(&self, summary: &TickSummary) {
        trace!(
            tick = summary.tick,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            failed = summary.failed_sources,
            skipped = summary.skipped_records,
            "Tick complete"
        );
    }
}

/// Sink keeping every notice in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingSink {
    failures: RefCell<Vec<String>>,
    skipped: RefCell<Vec<String>>,
    ticks: RefCell<Vec<TickSummary>>,
}

impl RecordingSink {
    /// Failure notices as `"<source>: <error>"`.
    pub fn failures(&self) -> Vec<String> {
        self.failures.borrow().clone()
    }

    /// Skipped-record notices as `"<source>: <error>"`.
    pub fn skipped(&self) -> Vec<String> {
        self.skipped.borrow().clone()
    }

    pub fn ticks(&self) -> Vec<TickSummary> {
        self.ticks.borrow().clone()
    }
}

impl LogSink for RecordingSink {
    fn source_failed(&self, source: &str, error: &SourceError) {
        self.failures
            .borrow_mut()
            .push(format!("{}: {}", source, error));
    }

    fn record_skipped(&self, source: &str, error: &SourceError) {
        self.skipped
            .borrow_mut()
            .push(format!("{}: {}", source, error));
    }

    fn tick_completed(&self, summary: &TickSummary) {
        self.ticks.borrow_mut().push(*summary);
    }
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn source_failed(&self, source: &str, error: &SourceError) {
        (**self).source_failed(source, error)
    }

    fn record_skipped(&self, source: &str, error: &SourceError) {
        (**self).record_skipped(source, error)
    }

    fn tick_completed(&self, summary: &TickSummary) {
        (**self).tick_completed(summary)
    }
}
