use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duui_heideltimex::config::{Config, LogFormat, WorkerPolicy};
use duui_heideltimex::server::{build_runtime, ComponentServer};

#[derive(Parser, Debug)]
#[command(
    name = "duui-heideltimex",
    version,
    about = "DUUI component annotating temporal expressions with Timex3 and Time",
    long_about = None
)]
struct Cli {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Worker threads: 1 for a single worker, n > 1 for a fixed pool, <= 0 for a cached pool
    #[arg(short = 'j', long, allow_negative_numbers = true)]
    workers: Option<i64>,

    /// Interface to bind
    #[arg(short = 'a', long)]
    address: Option<IpAddr>,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum request body in bytes
    #[arg(long)]
    max_payload_size: Option<usize>,

    /// Language for documents without one
    #[arg(long)]
    language: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Cli {
    /// Load the base configuration and apply command-line overrides
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env()?,
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(workers) = self.workers {
            config.server.workers = WorkerPolicy::from_workers(workers);
        }
        if let Some(address) = self.address {
            config.server.bind_address = address;
        }
        if let Some(bytes) = self.max_payload_size {
            config.server.max_payload_bytes = bytes;
        }
        if let Some(language) = self.language {
            config.engine.default_language = language;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;

    // Initialize tracing/logging
    setup_tracing(&config)?;

    let runtime =
        build_runtime(config.server.workers).context("Failed to build the async runtime")?;
    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> Result<()> {
    let server = ComponentServer::new(&config)?;
    println!("{}", server.info().display());

    let mut handle = server.spawn().await?;
    tracing::info!(addr = %handle.local_addr(), "DUUI component ready");

    let stopped = tokio::select! {
        result = handle.finished() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match stopped {
        Some(result) => result?,
        None => {
            tracing::info!("Shutdown signal received, waiting for in-flight requests");
            handle.shutdown().await?;
        }
    }

    tracing::info!("DUUI component stopped");
    Ok(())
}

fn setup_tracing(config: &Config) -> Result<()> {
    let level = config.logging.level.to_ascii_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "duui_heideltimex={level},tower_http={level},warn"
        ))
    });

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
    }

    Ok(())
}
