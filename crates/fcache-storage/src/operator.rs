//! OpenDAL Operator factory for fcache backends

use anyhow::{Context, Result};
use fcache_core::config::{BackendConfig, BackendKind};
use opendal::Operator;
use std::time::Duration;

/// Build the operator described by `cfg`.
///
/// memcached must accept items of at least 1 MiB plus key overhead
/// (start it with `-I 2m`), otherwise the largest chunks are refused.
pub fn build_operator(cfg: &BackendConfig) -> Result<Operator> {
    let op = match cfg.kind {
        BackendKind::Memcached => {
            if cfg.endpoint.is_empty() {
                anyhow::bail!("memcached backend requires backend.endpoint");
            }
            let mut builder = opendal::services::Memcached::default().endpoint(&cfg.endpoint);
            if cfg.default_ttl_secs > 0 {
                builder = builder.default_ttl(Duration::from_secs(cfg.default_ttl_secs));
            }
            Operator::new(builder)
                .with_context(|| format!("creating memcached operator for {}", cfg.endpoint))?
                .finish()
        }
        BackendKind::Memory => {
            tracing::warn!("using in-memory backend: stored files vanish with the process");
            Operator::new(opendal::services::Memory::default())
                .context("creating in-memory operator")?
                .finish()
        }
    };

    let mut op = op.layer(opendal::layers::LoggingLayer::default());
    if cfg.max_retries > 0 {
        op = op.layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(cfg.max_retries)
                .with_jitter(),
        );
    }
    Ok(op)
}

/// Process-local operator without retries, for tests and the `memory` kind.
pub fn memory_operator() -> Result<Operator> {
    Ok(Operator::new(opendal::services::Memory::default())
        .context("creating in-memory operator")?
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_memcached_operator() {
        let cfg = BackendConfig {
            endpoint: "tcp://127.0.0.1:11211".into(),
            default_ttl_secs: 600,
            ..Default::default()
        };
        let op = build_operator(&cfg);
        assert!(op.is_ok(), "operator construction should not connect");
    }

    #[test]
    fn test_memcached_requires_endpoint() {
        let cfg = BackendConfig {
            endpoint: String::new(),
            ..Default::default()
        };
        let err = build_operator(&cfg).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_build_memory_operator() {
        let cfg = BackendConfig {
            kind: BackendKind::Memory,
            max_retries: 0,
            ..Default::default()
        };
        assert!(build_operator(&cfg).is_ok());
    }
}
