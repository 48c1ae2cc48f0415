//! fcache: file cache CLI
//!
//! Commands:
//!   put <file>            - store a file, print its key
//!   get <key> [-o path]   - fetch a stored file (default ./<key>.dat)
//!   ping                  - set/get/delete smoke test against the backend
//!   config show           - display the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fcache_core::FcacheConfig;
use fcache_store::{ChunkStore, StoreOptions};
use indicatif::{ProgressBar, ProgressStyle};
use opendal::Operator;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "fcache",
    version,
    about = "fcache file cache client",
    long_about = "fcache: store files in memcached as randomly sized chunks keyed by content checksum"
)]
struct Cli {
    /// Path to fcache.toml configuration file
    #[arg(long, short = 'c', env = "FCACHE_CONFIG", default_value = "/etc/fcache/config.toml")]
    config: PathBuf,

    /// Backend endpoint, e.g. tcp://127.0.0.1:11211 (overrides backend.endpoint)
    #[arg(long, env = "FCACHE_ENDPOINT")]
    endpoint: Option<String>,

    /// Log level for diagnostics on stderr
    #[arg(long, env = "FCACHE_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a file and print its key
    Put {
        /// Local file to store
        file: PathBuf,
    },

    /// Fetch a stored file by key
    Get {
        /// File key printed by `put` (64 hex chars)
        key: String,
        /// Destination path (default: ./<key>.dat)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Check that the backend accepts a write, read and delete
    Ping,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let mut config = FcacheConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;
    if let Some(endpoint) = cli.endpoint {
        config.backend.endpoint = endpoint;
    }

    match cli.command {
        Commands::Put { file } => {
            let store = open_store(&config)?;
            let key = cmd_put(&store, &file).await?;
            println!("{}", put_message(&key));
            Ok(())
        }
        Commands::Get { key, output } => {
            let store = open_store(&config)?;
            let path = output.unwrap_or_else(|| default_output_path(&key));
            let bytes = cmd_get(&store, &key, &path).await?;
            tracing::info!(bytes, path = %path.display(), "file written");
            println!("{}", saved_message(&path));
            Ok(())
        }
        Commands::Ping => cmd_ping(&config).await,
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_store(config: &FcacheConfig) -> Result<ChunkStore<Operator>> {
    let options = StoreOptions::from_config(config).context("chunking config")?;
    let op = fcache_storage::build_operator(&config.backend).context("building backend operator")?;
    Ok(ChunkStore::with_options(op, options))
}

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn put_message(key: &str) -> String {
    format!("success! file key is {key}")
}

fn saved_message(path: &Path) -> String {
    format!("success! file saved to {}", path.display())
}

fn default_output_path(key: &str) -> PathBuf {
    PathBuf::from(format!("{key}.dat"))
}

// ── `fcache put` ──────────────────────────────────────────────────────────────

async fn cmd_put(store: &ChunkStore<Operator>, file: &Path) -> Result<String> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    let pb = make_spinner("put");
    pb.set_message(format!("{} ({})", file.display(), fmt_bytes(data.len() as u64)));
    let result = store.put(data).await;
    pb.finish_and_clear();

    let put = result.with_context(|| format!("storing {}", file.display()))?;
    if put.deduplicated {
        tracing::info!(key = %put.checksum, "content was already stored");
    }
    Ok(put.checksum.to_hex())
}

// ── `fcache get` ──────────────────────────────────────────────────────────────

async fn cmd_get(store: &ChunkStore<Operator>, key: &str, path: &Path) -> Result<u64> {
    let pb = make_spinner("get");
    pb.set_message(key.to_string());
    let result = store.get(key).await;
    pb.finish_and_clear();

    let data = result.with_context(|| format!("fetching {key}"))?;
    tokio::fs::write(path, &data)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(data.len() as u64)
}

// ── `fcache ping` ─────────────────────────────────────────────────────────────

async fn cmd_ping(config: &FcacheConfig) -> Result<()> {
    let op = fcache_storage::build_operator(&config.backend).context("building backend operator")?;
    fcache_storage::check_health(&op)
        .await
        .with_context(|| format!("backend {} is not healthy", config.backend.endpoint))?;
    println!("backend {} ok", config.backend.endpoint);
    Ok(())
}

// ── `fcache config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &FcacheConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
