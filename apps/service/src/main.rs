mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use logger::{LevelFilter, LogFormat};
use tracing::{info, warn};

use cli::{Cli, Commands, Overrides};
use sitewatch::config::{Config, ReportFormat};
use sitewatch::monitoring::{
    ConsoleReporter, Fanout, HttpProber, LogReporter, Prober, Reporter, SiteMonitor,
    StatusHistory, check_once,
};

/// Extra time granted to a probe on top of the HTTP client timeout
const DEADLINE_SLACK: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let command = cli.command();

    let mut config = Config::from_config(cli.config.as_deref()).context("loading config")?;
    apply_overrides(&mut config, &cli.overrides());

    init_logging(&config);

    match command {
        Commands::Config => {
            println!("{config}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Once(_) => run_once(&config).await,
        Commands::Run(_) => run(&config).await,
    }
}

fn apply_overrides(config: &mut Config, overrides: &Overrides) {
    if let Some(interval) = overrides.interval {
        config.monitor.interval_seconds = interval;
    }
    if let Some(timeout) = overrides.timeout {
        config.probe.timeout_seconds = timeout;
    }
    if overrides.json {
        config.output.format = ReportFormat::Json;
    }
    if !overrides.targets.is_empty() {
        config.monitor.targets = overrides.targets.clone();
    }
}

fn init_logging(config: &Config) {
    let level = config.logging.level.parse::<LevelFilter>();
    let format = match config.logging.format.as_str() {
        "" => None,
        raw => raw.parse::<LogFormat>().inspect_err(|e| eprintln!("{e}")).ok(),
    };

    let _ = logger::init_with(*level.as_ref().unwrap_or(&LevelFilter::INFO), format);

    if let Err(e) = level {
        warn!("Invalid log level {:?}, using info: {}", config.logging.level, e);
    }
}

fn build_prober(config: &Config) -> Result<Arc<dyn Prober>> {
    let user_agent = config.probe.user_agent.as_deref().unwrap_or(HttpProber::DEFAULT_USER_AGENT);
    let prober = HttpProber::with_user_agent(config.probe_timeout(), user_agent)
        .context("building HTTP client")?;
    Ok(Arc::new(prober))
}

/// Check until Ctrl-C, then drain in-flight checks and log a summary
async fn run(config: &Config) -> Result<ExitCode> {
    config.validate()?;

    let history = Arc::new(StatusHistory::new(config.history.capacity));
    let reporter = Fanout::new(vec![
        Arc::new(ConsoleReporter::new(config.output_format())),
        Arc::new(LogReporter),
        history.clone(),
    ]);

    let monitor = SiteMonitor::new(
        config.targets(),
        build_prober(config)?,
        Arc::new(reporter),
        config.retry_policy(),
    )?
    .with_probe_deadline(config.probe_timeout() + DEADLINE_SLACK);

    info!(
        "Monitoring {} sites every {}s",
        monitor.targets().len(),
        config.monitor.interval_seconds
    );
    let handle = monitor.spawn();

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    info!("Received shutdown signal...");

    let outcome = handle.shutdown(config.shutdown_grace()).await;

    for (target, totals) in history.summary() {
        info!(
            "{}: last={} up={} down={} error={}",
            target,
            totals.last.map(|status| status.to_string()).unwrap_or_else(|| "-".into()),
            totals.up,
            totals.down,
            totals.error
        );
    }

    outcome?;
    Ok(ExitCode::SUCCESS)
}

/// One concurrent round over every target
async fn run_once(config: &Config) -> Result<ExitCode> {
    config.validate()?;

    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new(config.output_format()));
    let results = check_once(config.targets(), build_prober(config)?, reporter).await?;

    let all_up = results.iter().all(|result| result.status.is_up());
    Ok(if all_up { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
