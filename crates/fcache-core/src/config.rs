use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FcacheError, FcacheResult};
use crate::types::{ChunkStrategy, MAX_CHUNK, MAX_FILE_SIZE, MIN_CHUNK};

/// Top-level configuration (loaded from fcache.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FcacheConfig {
    pub daemon: DaemonConfig,
    pub backend: BackendConfig,
    pub chunking: ChunkingConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// HTTP listen address for fcached (default: 127.0.0.1:8080)
    pub listen: String,
    /// Log level (default: info)
    pub log_level: String,
    /// Log format: "json" or "text"
    pub log_format: String,
}

/// Which cache service backs the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Memcached,
    /// Process-local map; contents vanish with the process
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// memcached endpoint (default: tcp://127.0.0.1:11211)
    pub endpoint: String,
    /// Expiry applied to every entry, in seconds (0 = never expire)
    pub default_ttl_secs: u64,
    /// Client-side retries for failed backend calls
    pub max_retries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub strategy: ChunkStrategy,
    pub min_chunk: usize,
    pub max_chunk: usize,
    /// Fixed RNG seed; unset means seeded from OS entropy
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted file in bytes (default: 50 MiB)
    pub max_file_size: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".into(),
            log_level: "info".into(),
            log_format: "text".into(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memcached,
            endpoint: "tcp://127.0.0.1:11211".into(),
            default_ttl_secs: 0,
            max_retries: 3,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Random,
            min_chunk: MIN_CHUNK,
            max_chunk: MAX_CHUNK,
            seed: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

impl FcacheConfig {
    /// Load and validate the config at `path`, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> FcacheResult<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            FcacheConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FcacheResult<()> {
        let chunking = &self.chunking;
        if chunking.min_chunk == 0 {
            return Err(FcacheError::Config(
                "chunking.min_chunk must be at least 1".into(),
            ));
        }
        if chunking.min_chunk > chunking.max_chunk {
            return Err(FcacheError::Config(format!(
                "chunking.min_chunk ({}) is larger than chunking.max_chunk ({})",
                chunking.min_chunk, chunking.max_chunk
            )));
        }
        if self.limits.max_file_size == 0 {
            return Err(FcacheError::Config(
                "limits.max_file_size must be greater than 0".into(),
            ));
        }
        if self.backend.kind == BackendKind::Memcached && self.backend.endpoint.is_empty() {
            return Err(FcacheError::Config(
                "backend.endpoint is required for the memcached backend".into(),
            ));
        }
        Ok(())
    }
}
