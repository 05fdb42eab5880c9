//! Ordered set of the metric sources sampled each tick.

use crate::config::MonitorConfig;
use crate::source::{MetricSource, Reading};
use crate::sources::{
    CpuSource, DiskSource, MemorySource, NetworkSource, ProcPaths, ProcessSource, SystemSource,
};

/// Registered metric sources, in registration order.
///
/// Sources are added once at startup and live until shutdown; there is no
/// removal.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Box<dyn MetricSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard collector set for `config`.
    ///
    /// Enabled sources are registered in a fixed order: system, cpu,
    /// memory, disk, network, process.
    pub fn from_config(config: &MonitorConfig) -> Self {
        let paths = ProcPaths::new(&config.proc_root);
        let collect = &config.collect;
        let mut registry = Self::new();

        if collect.system {
            registry.register(SystemSource::new(&paths));
        }
        if collect.cpu {
            registry.register(CpuSource::new(&paths));
        }
        if collect.memory {
            registry.register(MemorySource::new(&paths));
        }
        if collect.disk {
            registry.register(DiskSource::new(&paths));
        }
        if collect.network {
            registry.register(NetworkSource::new(&paths));
        }
        if collect.processes {
            registry.register(ProcessSource::new(&paths));
        }

        registry
    }

    /// Append a source; it will run after every source registered before it.
    pub fn register(&mut self, source: impl MetricSource + 'static) -> &mut Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn sources(&self) -> &[Box<dyn MetricSource>] {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut [Box<dyn MetricSource>] {
        &mut self.sources
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Latest reading of every source, in registration order.
    pub fn readings(&self) -> Vec<Reading> {
        self.sources.iter().map(|s| s.reading()).collect()
    }
}
