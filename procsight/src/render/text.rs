//! Full-screen terminal dashboard.

use std::io::{self, Write};

use super::format::{format_bytes, format_kb, format_percent, format_uptime, pages_to_mb};
use super::{Frame, Renderer};
use crate::source::Reading;
use crate::sources::{
    CpuReading, DiskReading, MemoryReading, NetworkReading, ProcessReading, SystemReading,
};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

const RULE: &str = "──────────────────────────────────────────────────────────────";

/// Redraws the whole screen every tick.
pub struct TextRenderer<W: Write> {
    out: W,
    host: String,
    top: usize,
}

impl<W: Write> TextRenderer<W> {
    /// Dashboard for `host` listing the `top` largest processes.
    pub fn new(out: W, host: impl Into<String>, top: usize) -> Self {
        Self {
            out,
            host: host.into(),
            top,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn header(&mut self, tick: u64) -> io::Result<()> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.out, "{BOLD}{CYAN}")?;
        writeln!(
            self.out,
            "╔══════════════════════════════════════════════════════════╗"
        )?;
        writeln!(
            self.out,
            "║                 Linux System Monitor                     ║"
        )?;
        writeln!(
            self.out,
            "╚══════════════════════════════════════════════════════════╝{RESET}"
        )?;
        writeln!(self.out, " Host: {}   Time: {}   Tick: {}", self.host, now, tick)?;
        writeln!(self.out)
    }

    fn system(&mut self, r: &SystemReading) -> io::Result<()> {
        writeln!(self.out, "System:")?;
        writeln!(self.out, "  Uptime:   {}", format_uptime(r.uptime_secs))?;
        writeln!(
            self.out,
            "  Load:     {:.2} (1m), {:.2} (5m), {:.2} (15m)",
            r.load_1, r.load_5, r.load_15
        )?;
        writeln!(
            self.out,
            "  Tasks:    {} running / {} total",
            r.running_tasks, r.total_tasks
        )
    }

    fn cpu(&mut self, r: &CpuReading) -> io::Result<()> {
        writeln!(self.out, "CPU usage: {}", format_percent(r.usage_percent))
    }

    fn memory(&mut self, r: &MemoryReading) -> io::Result<()> {
        writeln!(self.out, "Memory:")?;
        writeln!(self.out, "  Total:     {}", format_kb(r.total_kb))?;
        writeln!(self.out, "  Used:      {}", format_kb(r.used_kb))?;
        writeln!(self.out, "  Available: {}", format_kb(r.available_kb))?;
        writeln!(self.out, "  Usage:     {:.1}%", r.usage_percent)
    }

    fn disk(&mut self, r: &DiskReading) -> io::Result<()> {
        writeln!(self.out, "Disk I/O:")?;
        for disk in &r.devices {
            writeln!(self.out, "  {}:", disk.name)?;
            writeln!(self.out, "    Reads:           {}", disk.reads_completed)?;
            writeln!(self.out, "    Writes:          {}", disk.writes_completed)?;
            writeln!(self.out, "    Sectors read:    {}", disk.sectors_read)?;
            writeln!(self.out, "    Sectors written: {}", disk.sectors_written)?;
        }
        Ok(())
    }

    fn network(&mut self, r: &NetworkReading) -> io::Result<()> {
        writeln!(self.out, "Network:")?;
        for iface in &r.interfaces {
            writeln!(self.out, "  {}:", iface.name)?;
            writeln!(
                self.out,
                "    RX: {} ({} packets)",
                format_bytes(iface.rx_bytes),
                iface.rx_packets
            )?;
            writeln!(
                self.out,
                "    TX: {} ({} packets)",
                format_bytes(iface.tx_bytes),
                iface.tx_packets
            )?;
        }
        Ok(())
    }

    fn processes(&mut self, r: &ProcessReading) -> io::Result<()> {
        writeln!(self.out, "Processes:")?;
        writeln!(self.out, "  Total:    {}", r.total)?;
        writeln!(self.out, "  Running:  {}", r.running)?;
        writeln!(self.out, "  Top {} by memory:", self.top)?;
        for process in r.top(self.top) {
            writeln!(
                self.out,
                "    [{}] {} - {:.1} MB",
                process.pid,
                process.name,
                pages_to_mb(process.rss_pages)
            )?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        write!(self.out, "{CLEAR_SCREEN}")?;
        self.header(frame.summary.tick)?;

        let mut first = true;
        for (name, reading, stale) in frame.entries() {
            if !first {
                writeln!(self.out, "{YELLOW}{RULE}{RESET}")?;
            }
            first = false;

            match &reading {
                Reading::System(r) => self.system(r)?,
                Reading::Cpu(r) => self.cpu(r)?,
                Reading::Memory(r) => self.memory(r)?,
                Reading::Disk(r) => self.disk(r)?,
                Reading::Network(r) => self.network(r)?,
                Reading::Process(r) => self.processes(r)?,
            }
            if stale {
                writeln!(self.out, "  {RED}({} data is stale){RESET}", name)?;
            }
        }

        writeln!(self.out)?;
        writeln!(self.out, "{GREEN}[Refreshing every second | Ctrl+C to quit]{RESET}")?;
        self.out.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        writeln!(self.out, "{RESET}")?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SourceRegistry;
    use crate::scheduler::SamplingScheduler;
    use crate::sink::RecordingSink;
    use crate::sources::{MemorySource, ProcPaths, ProcessSource, SystemSource};

    fn render_once(registry: SourceRegistry, top: usize) -> String {
        let mut scheduler = SamplingScheduler::new(registry, RecordingSink::default());
        let summary = scheduler.tick();

        let mut renderer = TextRenderer::new(Vec::new(), "testhost", top);
        let frame = Frame {
            summary: &summary,
            registry: scheduler.registry(),
            statuses: scheduler.statuses(),
        };
        renderer.render(&frame).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_renders_memory_and_header() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("meminfo"),
            "MemTotal: 2048 kB\nMemAvailable: 1024 kB\n",
        )
        .unwrap();

        let mut registry = SourceRegistry::new();
        registry.register(MemorySource::new(&ProcPaths::new(dir.path())));
        let output = render_once(registry, 5);

        assert!(output.starts_with(CLEAR_SCREEN));
        assert!(output.contains("Host: testhost"));
        assert!(output.contains("Tick: 1"));
        assert!(output.contains("Total:     2.00 MB"));
        assert!(output.contains("Usage:     50.0%"));
        assert!(!output.contains("stale"));
    }

    #[test]
    fn test_marks_failed_source_stale() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = SourceRegistry::new();
        registry.register(SystemSource::new(&ProcPaths::new(dir.path())));

        let output = render_once(registry, 5);
        assert!(output.contains("(system data is stale)"));
    }

    #[test]
    fn test_lists_top_processes_in_mb() {
        let dir = tempfile::tempdir().unwrap();
        for (pid, rss) in [(1, 256), (2, 512), (3, 128)] {
            let proc_dir = dir.path().join(pid.to_string());
            std::fs::create_dir_all(&proc_dir).unwrap();
            std::fs::write(
                proc_dir.join("stat"),
                format!(
                    "{pid} (proc{pid}) S 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 1000 {rss} 0\n"
                ),
            )
            .unwrap();
        }

        let mut registry = SourceRegistry::new();
        registry.register(ProcessSource::new(&ProcPaths::new(dir.path())));
        let output = render_once(registry, 2);

        assert!(output.contains("Total:    3"));
        assert!(output.contains("[2] proc2 - 2.0 MB"));
        assert!(output.contains("[1] proc1 - 1.0 MB"));
        assert!(!output.contains("[3] proc3"));
    }
}
