//! # Fleet Loader
//!
//! Scheduled self-update run: reconcile the local agent bundle with the
//! manifest service and run the trigger if anything changed. Exits non-zero
//! on any failure.

use clap::Parser;
use event_log::{EventLog, EventSink, TracingRenderer};
use loader_core::{Step, StepContext, BUILD_INFO};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use update_engine::{FileConfig, LoaderSettings, Overrides, RunReport};

#[derive(Debug, Parser)]
#[command(name = "fleet-loader")]
#[command(about = "Fleet Loader - keep the agent bundle in line with the manifest service")]
#[command(version = loader_core::VERSION)]
struct Cli {
    /// Base URL of the manifest service API
    #[arg(long, env = "LOADER_API_URL")]
    api_url: Option<String>,

    /// Operator tag sent with every request
    #[arg(long, env = "LOADER_OPERATOR")]
    operator: Option<String>,

    /// JSON configuration file
    #[arg(long, env = "LOADER_CONFIG")]
    config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log filter, takes precedence over RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            operator: self.operator.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    info!("Starting {}", BUILD_INFO);

    let outcome = EventSink::scope(TracingRenderer, |events| async move {
        events.info("logging routine started").await;
        let result = run(&cli, &events).await;
        if let Err(e) = &result {
            events.error(e.to_string()).await;
        }
        result
    })
    .await;

    match outcome {
        Ok(report) => {
            info!("run complete: {}", report.summary());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("run failed");
            eprintln!("fleet-loader: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, events: &EventLog) -> anyhow::Result<RunReport> {
    let file = cli
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()
        .step(Step::Configure)?;
    let settings = LoaderSettings::resolve(cli.overrides(), file).step(Step::Configure)?;
    info!(
        api_url = %settings.api_url,
        platform = %settings.platform,
        "configuration loaded"
    );

    let driver = settings.into_driver().step(Step::Configure)?;
    let report = driver.run(events).await?;
    Ok(report)
}
