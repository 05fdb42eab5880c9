//! Live Linux system monitor.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use procsight::SourceRegistry;
use procsight::args::CliArgs;
use procsight::config::{OutputFormat, ProcsightConfig};
use procsight::render::{JsonRenderer, Renderer, TextRenderer};
use procsight::scheduler::{self, SamplingScheduler};

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = ProcsightConfig::resolve(args.config.as_deref())?;
    config.apply_args(&args)?;

    procsight_common::init_tracing(&config.logging)?;

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    let registry = SourceRegistry::from_config(&config.monitor);
    info!(
        proc_root = %config.monitor.proc_root.display(),
        sources = ?registry.names(),
        hostname = %hostname,
        "Starting procsight"
    );

    let mut renderer: Box<dyn Renderer> = match config.monitor.output {
        OutputFormat::Text => Box::new(TextRenderer::new(
            std::io::stdout(),
            hostname,
            config.monitor.top_processes,
        )),
        OutputFormat::Json => Box::new(JsonRenderer::new(std::io::stdout(), hostname)),
    };

    let mut sampler = SamplingScheduler::with_tracing(registry);
    let runtime = scheduler::build_runtime().context("Scheduler failed to start")?;

    runtime
        .block_on(async {
            let shutdown = scheduler::shutdown_signal()?;
            sampler.run_until(&mut renderer, shutdown).await;
            Ok::<_, procsight::error::SchedulerError>(())
        })
        .context("Scheduler failed")?;

    Ok(())
}
