//! Live Linux system monitor.
//!
//! Samples the proc filesystem once per second and renders CPU usage,
//! memory, disk and network counters, load averages and the largest
//! processes, either as a terminal dashboard or as JSON lines.
//!
//! # Pipeline
//!
//! ```text
//! SamplingScheduler ──tick──▶ SourceRegistry ──update()──▶ MetricSource
//!        │                                    acquire → parse → derive
//!        └──Frame──▶ Renderer (text | json)
//! ```
//!
//! Failures stay inside the source that hit them: they are reported to a
//! [`LogSink`](sink::LogSink) and the source keeps its previous reading.

pub mod args;
pub mod config;
pub mod error;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod sources;

pub use registry::SourceRegistry;
pub use scheduler::{SamplingScheduler, SchedulerState, TICK_PERIOD, TickSummary};
pub use source::{MetricSource, Reading, update};
