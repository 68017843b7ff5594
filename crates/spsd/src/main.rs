//! spsd — spot placement score daemon.
//!
//! # Usage
//!
//! ```text
//! spsd --settings sps.toml invoke
//! spsd --config s3://bucket/sps/config.yaml run
//! spsd --config ./config.yaml synth --out ./dashboards
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use sps_core::settings::SinkKind;
use sps_core::{ConfigSource, FixtureScoreProvider, HttpObjectStore, ObjectStore, ScoreProvider, Settings};
use sps_dashboard::{DashboardBuilder, WidgetOptions};
use sps_metrics::{LogSink, MetricsSink, Publisher, TextfileSink};
use spsd::schedule::{self, Schedule};
use spsd::{Collector, InvocationContext, synth};
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(name = "spsd", about = "Spot placement score collector", version)]
struct Cli {
    /// Daemon settings file. Missing file means defaults.
    #[arg(long, default_value = "sps.toml")]
    settings: PathBuf,

    /// Configuration document URI (file path, file://, or s3://bucket/key).
    /// Resolved from the environment when omitted.
    #[arg(long)]
    config: Option<String>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single collection pass and print the response.
    Invoke {
        /// Request id attached to the invocation.
        #[arg(long, default_value = "local")]
        request_id: String,
    },

    /// Run the collector on its own schedule until interrupted.
    Run,

    /// Build dashboard bodies and print provisioning outputs.
    Synth {
        /// Directory receiving one JSON body per dashboard.
        #[arg(long, default_value = "dashboards")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let settings = load_settings(&cli.settings)?;
    let source = match &cli.config {
        Some(uri) => ConfigSource::parse(uri)?,
        None => ConfigSource::from_env()?,
    };
    info!(source = source.scheme(), "configuration source resolved");

    let store: Arc<dyn ObjectStore> =
        Arc::new(HttpObjectStore::new(settings.collector.object_store.clone()));
    let provider = build_provider(&settings)?;

    match cli.command {
        Command::Invoke { request_id } => {
            let collector = Collector::new(
                source,
                store,
                Publisher::new(provider, build_sink(&settings)?),
            );
            let response = collector
                .handle(&json!({}), &InvocationContext::new(request_id))
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Run => {
            let collector = Collector::new(
                source,
                store,
                Publisher::new(provider, build_sink(&settings)?),
            );
            let schedule = Schedule {
                interval: settings.interval()?,
                budget: settings.budget()?,
            };
            run_scheduled(collector, schedule).await
        }
        Command::Synth { out } => {
            let groups = source.load(store.as_ref()).await?;
            let options = WidgetOptions {
                region: settings.provisioning.region.clone(),
                period: settings.period()?,
                stat: settings.dashboard.stat.clone(),
            };
            let synthesis = synth::synthesize(
                &DashboardBuilder::new(provider),
                &groups,
                &options,
                &settings.provisioning,
                &out,
            )
            .await?;
            info!(dashboards = synthesis.files.len(), out = %out.display(), "synthesis complete");
            println!("{}", serde_json::to_string_pretty(&synthesis.outputs)?);
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,spsd=debug,sps=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    if path.exists() {
        let settings = Settings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?;
        info!(path = %path.display(), "settings loaded");
        Ok(settings)
    } else {
        info!(path = %path.display(), "settings file not found, using defaults");
        Ok(Settings::default())
    }
}

fn build_provider(settings: &Settings) -> anyhow::Result<Arc<dyn ScoreProvider>> {
    let Some(path) = &settings.provider.fixture else {
        bail!("no score provider configured: set [provider] fixture in the settings file");
    };
    let provider = FixtureScoreProvider::from_file(path)
        .with_context(|| format!("failed to load score fixture {}", path.display()))?;
    info!(path = %path.display(), "fixture score provider loaded");
    Ok(Arc::new(provider))
}

fn build_sink(settings: &Settings) -> anyhow::Result<Arc<dyn MetricsSink>> {
    match settings.sink.kind {
        SinkKind::Log => Ok(Arc::new(LogSink)),
        SinkKind::Textfile => {
            let Some(path) = &settings.sink.path else {
                bail!("textfile sink requires [sink] path");
            };
            info!(path = %path.display(), "prometheus textfile sink");
            Ok(Arc::new(TextfileSink::new(path)))
        }
    }
}

async fn run_scheduled(collector: Collector, schedule: Schedule) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move { schedule::run(&collector, schedule, shutdown_rx).await });

    tokio::signal::ctrl_c()
        .await
        .context("failed to install CTRL+C handler")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let runs = handle.await.context("collector loop panicked")?;
    info!(runs, "spsd stopped");
    Ok(())
}
