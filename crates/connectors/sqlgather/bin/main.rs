use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use query_engine_execution::accumulator::Accumulator;
use sqlgather::connector::Gatherer;
use sqlgather::error::GatherError;
use sqlgather::exposition::write_metrics_file;
use sqlgather::line_protocol::LineProtocolAccumulator;
use sqlgather_configuration::environment::ProcessEnvironment;
use sqlgather_configuration::{
    make_runtime_configuration, parse_configuration, sample_configuration, ParsedConfiguration,
};

#[derive(Parser)]
#[command(version, about = sqlgather_configuration::description())]
struct Options {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect metrics and write them to stdout as line protocol.
    Run {
        /// Directory containing configuration.json.
        #[arg(long, value_name = "DIRECTORY", env = "SQLGATHER_CONFIGURATION")]
        configuration: PathBuf,
        /// Seconds between collection cycles.
        #[arg(long, value_name = "SECONDS", default_value_t = 10)]
        interval: u64,
        /// Run a single cycle and exit.
        #[arg(long)]
        once: bool,
        /// Write the collector's own metrics here, in the Prometheus text format, after every
        /// cycle.
        #[arg(long, value_name = "PATH")]
        metrics_file: Option<PathBuf>,
    },
    /// Print a sample configuration.json.
    SampleConfig,
    /// Print the JSON schema of configuration.json.
    PrintSchema,
}

#[tokio::main]
pub async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    match run(Options::parse().command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run {
            configuration,
            interval,
            once,
            metrics_file,
        } => gather(configuration, interval, once, metrics_file).await,
        Command::SampleConfig => {
            print!("{}", sample_configuration()?);
            Ok(())
        }
        Command::PrintSchema => {
            let schema = schemars::schema_for!(ParsedConfiguration);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

async fn gather(
    configuration_dir: PathBuf,
    interval: u64,
    once: bool,
    metrics_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let parsed = parse_configuration(&configuration_dir)
        .await
        .with_context(|| format!("reading {}", configuration_dir.display()))?;
    let configuration = make_runtime_configuration(parsed, &ProcessEnvironment)?;

    let mut registry = prometheus::Registry::new();
    let gatherer = Gatherer::new(configuration, &mut registry)?;
    tracing::info!(identity = ?gatherer.identity(), "starting collector");

    let accumulator: Arc<dyn Accumulator> = Arc::new(LineProtocolAccumulator::new(io::stdout()));
    let metrics_file = metrics_file.as_deref();

    if once {
        return cycle(&gatherer, &accumulator, &registry, metrics_file)
            .await
            .map_err(Into::into);
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        // the cycle runs inside the select, so a shutdown signal interrupts it
        tokio::select! {
            result = &mut shutdown => {
                result.context("listening for shutdown signal")?;
                tracing::info!("shutting down");
                return Ok(());
            }
            result = async {
                ticker.tick().await;
                cycle(&gatherer, &accumulator, &registry, metrics_file).await
            } => {
                // a failed cycle is logged and the next one runs as scheduled
                if let Err(error) = result {
                    tracing::error!(%error, "collection cycle failed");
                }
            }
        }
    }
}

/// Run one collection cycle, then refresh the metrics file if there is one.
async fn cycle(
    gatherer: &Gatherer,
    accumulator: &Arc<dyn Accumulator>,
    registry: &prometheus::Registry,
    metrics_file: Option<&Path>,
) -> Result<(), GatherError> {
    let result = gatherer.gather(Arc::clone(accumulator)).await;
    if let Some(path) = metrics_file {
        if let Err(error) = write_metrics_file(registry, path).await {
            tracing::warn!(%error, "unable to write metrics file");
        }
    }
    result
}
