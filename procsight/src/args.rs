//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Live Linux system monitor sampling /proc once per second.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "procsight", version, about)]
pub struct CliArgs {
    /// Path to configuration file (default: <config dir>/procsight/procsight.json5).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Read from this directory instead of /proc.
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Emit one JSON object per tick instead of the dashboard.
    #[arg(long)]
    pub json: bool,

    /// Number of processes to list.
    #[arg(long)]
    pub top: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let args = CliArgs::try_parse_from(["procsight"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.json);
    }

    #[test]
    fn test_all_arguments() {
        let args = CliArgs::try_parse_from([
            "procsight",
            "-c",
            "monitor.json5",
            "--log-level",
            "debug",
            "--proc-root",
            "/host/proc",
            "--json",
            "--top",
            "3",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("monitor.json5")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.proc_root, Some(PathBuf::from("/host/proc")));
        assert!(args.json);
        assert_eq!(args.top, Some(3));
    }

    #[test]
    fn test_rejects_bad_top() {
        assert!(CliArgs::try_parse_from(["procsight", "--top", "many"]).is_err());
    }
}
