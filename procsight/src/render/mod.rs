//! Presentation of each tick's readings.

mod format;
mod json;
mod text;

use std::io;

use crate::registry::SourceRegistry;
use crate::scheduler::TickSummary;
use crate::source::{Reading, UpdateStatus};

pub use format::{format_bytes, format_kb, format_percent, format_uptime, pages_to_mb};
pub use json::JsonRenderer;
pub use text::TextRenderer;

/// Everything a renderer sees after one tick.
pub struct Frame<'a> {
    pub summary: &'a TickSummary,
    pub registry: &'a SourceRegistry,
    /// Outcome per source, parallel to the registry.
    pub statuses: &'a [UpdateStatus],
}

impl Frame<'_> {
    /// `(name, reading, stale)` for every source, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, Reading, bool)> + '_ {
        self.registry.sources().iter().enumerate().map(|(i, source)| {
            let stale = self.statuses.get(i).is_some_and(|s| s.failed);
            (source.name(), source.reading(), stale)
        })
    }
}

/// Consumer of per-tick frames.
pub trait Renderer {
    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()>;

    /// Called once after the last frame.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        (**self).render(frame)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}
