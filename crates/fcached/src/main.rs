//! fcached: file cache daemon
//!
//! Usage:
//!   fcached [--config /etc/fcache/config.toml] [--listen 127.0.0.1:8080]
//!
//! Serves `POST /filecache` and `GET /filecache/{key}` over a memcached
//! backend, plus `/healthz`, `/readyz` and `/metrics`.

mod daemon;
mod http;
mod metrics;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use fcache_core::FcacheConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fcached", version, about = "fcache file cache daemon")]
struct Cli {
    /// Path to fcache.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "FCACHE_CONFIG",
        default_value = "/etc/fcache/config.toml"
    )]
    config: PathBuf,

    /// Address to serve HTTP on (overrides daemon.listen)
    #[arg(long, env = "FCACHE_LISTEN")]
    listen: Option<String>,

    /// Backend endpoint, e.g. tcp://127.0.0.1:11211 (overrides backend.endpoint)
    #[arg(long, env = "FCACHE_ENDPOINT")]
    endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides daemon.log_level
    #[arg(long, env = "FCACHE_LOG")]
    log: Option<String>,

    /// Log format; overrides daemon.log_format
    #[arg(long, env = "FCACHE_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = FcacheConfig::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        config.daemon.listen = listen;
    }
    if let Some(endpoint) = cli.endpoint {
        config.backend.endpoint = endpoint;
    }

    let level = cli.log.unwrap_or_else(|| config.daemon.log_level.clone());
    let format = match cli.log_format {
        Some(format) => format,
        None => LogFormat::from_str(&config.daemon.log_format, true)
            .map_err(|e| anyhow::anyhow!("daemon.log_format: {e}"))?,
    };
    init_logging(&level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        config_found = cli.config.exists(),
        "fcached starting"
    );

    daemon::run(config).await
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
