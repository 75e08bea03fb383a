mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use prometheus::{Encoder, Registry, TextEncoder};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use playbuild_core::{
    load_config, metrics, validate_config, BuildTarget, Config, EventEnvelope, EventHandle,
    FsSourceBuilder, FsSupplementarySource, Playlist, PlaylistBuilder,
};

use report::{summary, PlaylistReport};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for the pipeline event channel
const EVENT_BUFFER_SIZE: usize = 1000;

/// Config file used when neither `--config` nor `PLAYBUILD_CONFIG` is given
const DEFAULT_CONFIG: &str = "playbuild.toml";

/// Builds the media of a metadata payload into a playlist
#[derive(Parser, Debug)]
#[command(name = "playbuild")]
#[command(about = "Build playlist media from a production-tracking payload")]
#[command(version)]
struct Args {
    /// JSON payload holding the versions to build
    payload: PathBuf,

    /// Config file (defaults to playbuild.toml when present)
    #[arg(long, env = "PLAYBUILD_CONFIG")]
    config: Option<PathBuf>,

    /// Write Prometheus metrics to stderr after the run
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("playbuild: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let config = read_config(args.config.as_ref())?;

    init_logging(&config);
    info!(version = VERSION, "playbuild starting");

    let payload_text = tokio::fs::read_to_string(&args.payload)
        .await
        .with_context(|| format!("Failed to read payload {:?}", args.payload))?;
    let payload: Value = serde_json::from_str(&payload_text)
        .with_context(|| format!("Payload {:?} is not valid JSON", args.payload))?;

    let registry = Registry::new();
    for metric in metrics::all_metrics() {
        registry
            .register(metric)
            .context("Failed to register metrics")?;
    }

    let (events, event_rx) = EventHandle::channel(EVENT_BUFFER_SIZE);
    let event_log = spawn_event_log(event_rx);

    let mut builder = PlaylistBuilder::new(
        config.pipeline.clone(),
        Arc::new(FsSourceBuilder::new(config.sources.clone())),
    )
    .with_events(events);

    match config.supplementary.root.as_ref().filter(|_| config.supplementary.enabled) {
        Some(root) => {
            info!(root = %root.display(), "Supplementary sources enabled");
            builder = builder.with_supplementary(Arc::new(FsSupplementarySource::new(root)));
        }
        None => info!("Supplementary sources disabled"),
    }

    builder.start().await;

    let name = payload
        .pointer("/data/attributes/code")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            args.payload
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "playlist".to_string());
    let playlist = Arc::new(Playlist::new(name, builder.default_rate()));

    let batch = builder
        .submit_payload(&payload, BuildTarget::into_container(playlist.clone()))
        .await
        .context("Failed to submit payload")?;
    let requested = batch.len();
    info!(batch_id = %batch.batch_id(), requested, "Submitted payload");

    let media = batch.wait().await.context("Batch did not complete")?;

    let status = builder.status().await;
    info!("{}", summary(&status));

    let report = PlaylistReport::collect(&playlist, requested, &media).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to render report")?
    );

    if args.metrics {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        eprint!("{}", String::from_utf8_lossy(&buffer));
    }

    // Dropping the builder closes the event channel so the log task drains and exits.
    builder.stop().await;
    drop(builder);
    let _ = event_log.await;

    Ok(())
}

/// Reads the config file, falling back to defaults when the default path is absent.
fn read_config(explicit: Option<&PathBuf>) -> Result<Config> {
    let config = match explicit {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG);
            if path.exists() {
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))?
            } else {
                Config::default()
            }
        }
    };

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    // Logs go to stderr; stdout carries the report.
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn spawn_event_log(mut rx: tokio::sync::mpsc::Receiver<EventEnvelope>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            match serde_json::to_string(&envelope) {
                Ok(line) => debug!(target: "playbuild::events", "{}", line),
                Err(e) => error!("Failed to serialize event: {}", e),
            }
        }
    })
}
