//! Process table summary from `/proc/<pid>/stat`.

use std::io;

use serde::Serialize;
use tracing::trace;

use super::{ProcPaths, read_lossy};
use crate::error::SourceError;
use crate::source::{MetricSource, ParseReport, Reading};

const NAME: &str = "process";

/// Position of vsize among the fields following the command name
/// (field 0 is the state).
const VSIZE_FIELD: usize = 20;
const RSS_FIELD: usize = 21;

/// `No such process`, returned when reading a pid's files after it exits.
const ESRCH: i32 = 3;

/// One live process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub state: char,
    /// Virtual memory size in bytes.
    pub vsize: u64,
    /// Resident set size in memory pages, not bytes.
    pub rss_pages: u64,
}

/// Parse a `pid (comm) state ppid ...` status line.
///
/// The command name is everything between the first `(` and the last `)`,
/// so names containing spaces or parentheses survive. Only pid, name and
/// state are required; vsize and rss read as zero when absent.
pub fn parse_stat_line(line: &str) -> Result<ProcessEntry, String> {
    let open = line.find('(').ok_or("missing '('")?;
    let close = line.rfind(')').ok_or("missing ')'")?;
    if close < open {
        return Err("')' before '('".to_string());
    }

    let pid = line[..open]
        .trim()
        .parse()
        .map_err(|e| format!("invalid pid: {}", e))?;
    let name = line[open + 1..close].to_string();

    let fields: Vec<&str> = line[close + 1..].split_whitespace().collect();
    let state = fields
        .first()
        .and_then(|s| s.chars().next())
        .ok_or("missing state")?;

    let number = |idx: usize| -> u64 {
        fields
            .get(idx)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    Ok(ProcessEntry {
        pid,
        name,
        state,
        vsize: number(VSIZE_FIELD),
        rss_pages: number(RSS_FIELD),
    })
}

/// Whether a failed stat read means the process exited after the
/// directory was listed.
fn exited(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::NotFound || error.raw_os_error() == Some(ESRCH)
}

/// Process table reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessReading {
    pub total: usize,
    /// Processes in state `R`.
    pub running: usize,
    /// All processes, largest RSS first.
    pub processes: Vec<ProcessEntry>,
}

impl ProcessReading {
    /// The `n` processes using the most resident memory.
    pub fn top(&self, n: usize) -> &[ProcessEntry] {
        &self.processes[..n.min(self.processes.len())]
    }
}

/// Collector walking the process table.
///
/// The scan needs a directory traversal rather than a single file read, so
/// all work happens in parse and acquire does nothing.
pub struct ProcessSource {
    paths: ProcPaths,
    reading: ProcessReading,
}

impl ProcessSource {
    pub fn new(paths: &ProcPaths) -> Self {
        Self {
            paths: paths.clone(),
            reading: ProcessReading::default(),
        }
    }

    pub fn current(&self) -> &ProcessReading {
        &self.reading
    }
}

impl MetricSource for ProcessSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn acquire(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    fn parse(&mut self) -> Result<ParseReport, SourceError> {
        let root = self.paths.root();
        let entries = std::fs::read_dir(root).map_err(|e| SourceError::unavailable(root, e))?;

        let mut report = ParseReport::default();
        let mut processes = Vec::new();

        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(pid) = file_name.to_str() else {
                continue;
            };
            if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }

            let stat_path = self.paths.process_stat(pid);
            let content = match read_lossy(&stat_path) {
                Ok(content) => content,
                Err(e) if exited(&e) => {
                    trace!(pid, error = %e, "Process vanished during scan");
                    continue;
                }
                Err(e) => {
                    report.skip(SourceError::unavailable(&stat_path, e));
                    continue;
                }
            };

            let Some(line) = content.lines().next() else {
                continue;
            };
            match parse_stat_line(line) {
                Ok(process) => processes.push(process),
                Err(reason) => report.skip(SourceError::malformed(NAME, line, reason)),
            }
        }

        processes.sort_by(|a, b| b.rss_pages.cmp(&a.rss_pages).then(a.pid.cmp(&b.pid)));

        self.reading = ProcessReading {
            total: processes.len(),
            running: processes.iter().filter(|p| p.state == 'R').count(),
            processes,
        };

        Ok(report)
    }

    fn reading(&self) -> Reading {
        Reading::Process(self.reading.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use crate::source::update;
    use std::path::Path;

    fn stat_line(pid: u32, name: &str, state: char, vsize: u64, rss: u64) -> String {
        format!(
            "{pid} ({name}) {state} 1 {pid} {pid} 0 -1 4194560 1200 0 0 0 10 5 0 0 20 0 1 0 100 {vsize} {rss} 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0"
        )
    }

    fn add_process(root: &Path, pid: u32, line: &str) {
        let dir = root.join(pid.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stat"), format!("{}\n", line)).unwrap();
    }

    #[test]
    fn test_parse_name_with_space() {
        let process = parse_stat_line("42 (my proc) R 1 ...").unwrap();
        assert_eq!(process.pid, 42);
        assert_eq!(process.name, "my proc");
        assert_eq!(process.state, 'R');
        assert_eq!(process.vsize, 0);
        assert_eq!(process.rss_pages, 0);
    }

    #[test]
    fn test_parse_name_with_parens() {
        let line = stat_line(7, "weird) (name", 'S', 4096, 3);
        let process = parse_stat_line(&line).unwrap();
        assert_eq!(process.name, "weird) (name");
        assert_eq!(process.state, 'S');
        assert_eq!(process.vsize, 4096);
        assert_eq!(process.rss_pages, 3);
    }

    #[test]
    fn test_parse_full_line() {
        let line = stat_line(1234, "bash", 'S', 23_068_672, 1_337);
        let process = parse_stat_line(&line).unwrap();
        assert_eq!(process.pid, 1234);
        assert_eq!(process.vsize, 23_068_672);
        assert_eq!(process.rss_pages, 1_337);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_stat_line("").is_err());
        assert!(parse_stat_line("42 no parens R").is_err());
        assert!(parse_stat_line("x (name) R").is_err());
        assert!(parse_stat_line("42 (name)").is_err());
    }

    #[test]
    fn test_scan_sorts_by_rss_and_counts_running() {
        let dir = tempfile::tempdir().unwrap();
        add_process(dir.path(), 1, &stat_line(1, "init", 'S', 1000, 50));
        add_process(dir.path(), 20, &stat_line(20, "db server", 'R', 9000, 900));
        add_process(dir.path(), 300, &stat_line(300, "cron", 'S', 500, 10));
        add_process(dir.path(), 4000, &stat_line(4000, "worker", 'R', 7000, 900));
        // Non-process entries are ignored.
        std::fs::create_dir_all(dir.path().join("sys")).unwrap();
        std::fs::write(dir.path().join("uptime"), "1.0 1.0\n").unwrap();

        let sink = RecordingSink::default();
        let mut source = ProcessSource::new(&ProcPaths::new(dir.path()));
        let status = update(&mut source, &sink);

        assert!(!status.failed);
        let reading = source.current();
        assert_eq!(reading.total, 4);
        assert_eq!(reading.running, 2);

        let pids: Vec<u32> = reading.processes.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![20, 4000, 1, 300]);
        assert_eq!(reading.top(2).len(), 2);
        assert_eq!(reading.top(10).len(), 4);
    }

    #[test]
    fn test_vanished_process_is_skipped_silently() {
        let dir = tempfile::tempdir().unwrap();
        add_process(dir.path(), 1, &stat_line(1, "init", 'S', 1000, 50));
        // Directory without a stat file: process exited mid-scan.
        std::fs::create_dir_all(dir.path().join("99")).unwrap();

        let sink = RecordingSink::default();
        let mut source = ProcessSource::new(&ProcPaths::new(dir.path()));
        let status = update(&mut source, &sink);

        assert_eq!(status, crate::source::UpdateStatus::default());
        assert!(sink.failures().is_empty());
        assert!(sink.skipped().is_empty());
        assert_eq!(source.current().total, 1);
    }

    #[test]
    fn test_non_utf8_name_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        add_process(dir.path(), 1, &stat_line(1, "init", 'S', 1000, 50));
        let mut line = b"2 (b".to_vec();
        line.push(0xff);
        line.extend_from_slice(b"d) R 1 2 2 0 -1 0 0 0 0 0 0 0 0 0 20 0 1 0 1 4096 80 0\n");
        std::fs::create_dir_all(dir.path().join("2")).unwrap();
        std::fs::write(dir.path().join("2").join("stat"), line).unwrap();

        let sink = RecordingSink::default();
        let mut source = ProcessSource::new(&ProcPaths::new(dir.path()));
        let status = update(&mut source, &sink);

        assert_eq!(status, crate::source::UpdateStatus::default());
        let reading = source.current();
        assert_eq!(reading.total, 2);
        assert_eq!(reading.running, 1);
        assert_eq!(reading.processes[0].pid, 2);
        assert_eq!(reading.processes[0].name, "b\u{FFFD}d");
        assert_eq!(reading.processes[0].rss_pages, 80);
    }

    #[test]
    fn test_malformed_stat_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        add_process(dir.path(), 1, &stat_line(1, "init", 'S', 1000, 50));
        add_process(dir.path(), 2, "garbage");

        let sink = RecordingSink::default();
        let mut source = ProcessSource::new(&ProcPaths::new(dir.path()));
        let status = update(&mut source, &sink);

        assert_eq!(status.skipped, 1);
        assert_eq!(source.current().total, 1);
    }

    #[test]
    fn test_missing_root_keeps_previous_reading() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proc");
        add_process(&root, 1, &stat_line(1, "init", 'S', 1000, 50));

        let sink = RecordingSink::default();
        let mut source = ProcessSource::new(&ProcPaths::new(&root));
        update(&mut source, &sink);
        assert_eq!(source.current().total, 1);

        std::fs::remove_dir_all(&root).unwrap();
        let status = update(&mut source, &sink);

        assert!(status.failed);
        assert_eq!(source.current().total, 1);
        assert_eq!(sink.failures().len(), 1);
    }
}
