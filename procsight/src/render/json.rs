//! Machine-readable output: one JSON object per tick.

use std::io::{self, Write};

use procsight_common::TickRecord;

use super::{Frame, Renderer};
use crate::source::Reading;

/// Writes a [`TickRecord`] line per tick.
pub struct JsonRenderer<W: Write> {
    out: W,
    host: String,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W, host: impl Into<String>) -> Self {
        Self {
            out,
            host: host.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        let readings: Vec<Reading> = frame.entries().map(|(_, reading, _)| reading).collect();
        let record = TickRecord::new(self.host.as_str(), frame.summary.tick, readings);

        let line = record
            .to_json_line()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }
}
