//! Fixed-period sampling loop.
//!
//! Every tick updates all registered sources once, in registration order,
//! then hands the result to a [`Renderer`]. The loop runs on a
//! current-thread tokio runtime; an overrunning tick delays the next one
//! rather than triggering a catch-up burst.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::runtime::Runtime;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::registry::SourceRegistry;
use crate::render::{Frame, Renderer};
use crate::sink::{LogSink, TracingSink};
use crate::source::{UpdateStatus, update};

/// Time between the starts of two consecutive ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Outcome of one tick across all sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// 1-based tick number.
    pub tick: u64,
    pub elapsed: Duration,
    /// Sources whose acquire or parse failed this tick.
    pub failed_sources: usize,
    pub skipped_records: usize,
}

/// Lifecycle of a [`SamplingScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No tick has run yet.
    Idle,
    /// At least one tick has completed.
    Running { ticks: u64 },
}

/// Drives every registered source through one update per tick.
pub struct SamplingScheduler<K: LogSink = TracingSink> {
    registry: SourceRegistry,
    sink: K,
    state: SchedulerState,
    statuses: Vec<UpdateStatus>,
}

impl SamplingScheduler<TracingSink> {
    /// Scheduler reporting through `tracing`.
    pub fn with_tracing(registry: SourceRegistry) -> Self {
        Self::new(registry, TracingSink)
    }
}

impl<K: LogSink> SamplingScheduler<K> {
    pub fn new(registry: SourceRegistry, sink: K) -> Self {
        Self {
            registry,
            sink,
            state: SchedulerState::Idle,
            statuses: Vec::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        match self.state {
            SchedulerState::Idle => 0,
            SchedulerState::Running { ticks } => ticks,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Per-source outcome of the last tick, in registration order.
    pub fn statuses(&self) -> &[UpdateStatus] {
        &self.statuses
    }

    /// Run a single tick synchronously.
    ///
    /// Each source is updated exactly once. A failing source is reported to
    /// the sink and does not affect the sources after it.
    pub fn tick(&mut self) -> TickSummary {
        let started = Instant::now();
        let tick = self.ticks() + 1;

        self.statuses.clear();
        for source in self.registry.sources_mut() {
            let status = update(source.as_mut(), &self.sink);
            self.statuses.push(status);
        }

        let summary = TickSummary {
            tick,
            elapsed: started.elapsed(),
            failed_sources: self.statuses.iter().filter(|s| s.failed).count(),
            skipped_records: self.statuses.iter().map(|s| s.skipped).sum(),
        };

        self.state = SchedulerState::Running { ticks: tick };
        self.sink.tick_completed(&summary);

        if summary.elapsed > TICK_PERIOD {
            debug!(
                tick,
                elapsed_ms = summary.elapsed.as_millis() as u64,
                "Tick overran the sampling period"
            );
        }

        summary
    }

    /// Tick once per [`TICK_PERIOD`] until `shutdown` resolves.
    ///
    /// The first tick runs immediately. Shutdown is only observed between
    /// ticks, so a tick that has started always completes and is rendered.
    pub async fn run_until<R, F>(&mut self, renderer: &mut R, shutdown: F)
    where
        R: Renderer + ?Sized,
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(sources = ?self.registry.names(), "Sampling started");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    let summary = self.tick();
                    let frame = Frame {
                        summary: &summary,
                        registry: &self.registry,
                        statuses: &self.statuses,
                    };
                    if let Err(e) = renderer.render(&frame) {
                        warn!(tick = summary.tick, error = %e, "Failed to render tick");
                    }
                }
            }
        }

        if let Err(e) = renderer.finish() {
            warn!(error = %e, "Failed to restore output");
        }

        info!(ticks = self.ticks(), "Sampling stopped");
    }
}

/// Build the single-threaded runtime the scheduler runs on.
pub fn build_runtime() -> Result<Runtime, SchedulerError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SchedulerError::Runtime)
}

/// Future resolving on Ctrl-C or, on Unix, SIGTERM.
///
/// Handlers are installed eagerly so a failure surfaces before sampling
/// starts. Must be called from within a runtime.
pub fn shutdown_signal() -> Result<impl Future<Output = ()>, SchedulerError> {
    #[cfg(unix)]
    let mut sigterm =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .map_err(SchedulerError::Signal)?;

    Ok(async move {
        #[cfg(unix)]
        let terminate = async move {
            sigterm.recv().await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Received Ctrl+C, shutting down..."),
                Err(e) => warn!(error = %e, "Ctrl+C handler failed, shutting down..."),
            },
            _ = terminate => info!("Received SIGTERM, shutting down..."),
        }
    })
}
