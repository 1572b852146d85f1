mod cli;
mod config;
mod error;
mod metrics;
mod observer;
mod orchestrator;
mod prober;
mod report;
mod scheduler;
mod stats;
mod targets;
mod util;

use clap::Parser;
use cli::Args;
use config::{LogFormat, ProbeConfig};
use metrics::ProbeMetrics;
use observer::{LogObserver, Observers};
use orchestrator::Orchestrator;
use prober::http::HttpTransport;
use scheduler::Scheduler;
use targets::HostTarget;

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load config first to get log level
    let mut config = ProbeConfig::load().await?;
    if let Some(ms) = args.timeout_ms {
        config.request_timeout_ms = ms;
        config.validate()?;
    }
    init_tracing(&config)?;

    let targets = load_targets(&args).await?;
    info!(hosts = targets.len(), count = args.count, timeout_ms = config.request_timeout_ms, "targets loaded");

    let metrics = match args.metrics_out {
        Some(_) => Some(ProbeMetrics::new()?),
        None => None,
    };
    let mut observers = Observers::new().with(Arc::new(LogObserver));
    if let Some(m) = &metrics {
        observers = observers.with(Arc::new(m.clone()));
    }

    let transport = HttpTransport::new(&config.user_agent, config.request_timeout(), config.max_redirects)
        .context("building HTTP client")?;
    let orchestrator = Orchestrator::new(Arc::new(transport), Arc::new(observers), config.request_timeout());

    let round = |n: u32| {
        let orchestrator = orchestrator.clone();
        let targets = targets.clone();
        let metrics = metrics.clone();
        let args = &args;
        async move {
            let table = orchestrator.run(&targets, args.count).await?;
            if args.every.is_some() {
                println!("Round {n}");
            }
            print!("{}", report::render_table(&table));
            if let Some(path) = &args.output {
                report::write_json(&table, path).await?;
                info!(path = %path.display(), "results written");
            }
            if let (Some(m), Some(path)) = (&metrics, &args.metrics_out) {
                m.write_textfile(path).await?;
            }
            Ok::<(), anyhow::Error>(())
        }
    };

    let scheduler = args
        .every
        .map(|secs| Scheduler::new(Duration::from_secs(secs)))
        .transpose()?;
    let work = async {
        match &scheduler {
            Some(scheduler) => scheduler.run(args.rounds, round).await,
            None => round(1).await,
        }
    };

    tokio::select! {
        res = work => res,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, abandoning in-flight probes");
            std::process::exit(130);
        }
    }
}

fn init_tracing(config: &ProbeConfig) -> anyhow::Result<()> {
    let log_level = config.get_tracing_level()?;
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("host_probe={}", log_level.as_str().to_lowercase()).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

async fn load_targets(args: &Args) -> anyhow::Result<Vec<HostTarget>> {
    let targets = match (&args.hosts, &args.file) {
        (Some(hosts), _) => targets::parse_host_list(hosts)?,
        (None, Some(path)) => targets::load_host_file(path).await?,
        (None, None) => anyhow::bail!("either --hosts or --file is required"),
    };
    if targets.is_empty() {
        anyhow::bail!("no hosts given");
    }
    Ok(targets)
}
