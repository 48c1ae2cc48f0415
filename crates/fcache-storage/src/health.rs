//! Backend health check

use anyhow::Result;
use bytes::Bytes;

use crate::backend::CacheBackend;

const PROBE_KEY_PREFIX: &str = "fcache-health-probe";
const PROBE_VALUE: &[u8] = b"fcache-health-probe-value";

/// Fresh key per probe, so overlapping probes on a shared backend never
/// delete each other's entry.
fn probe_key() -> String {
    format!("{PROBE_KEY_PREFIX}-{:016x}", rand::random::<u64>())
}

/// Write a probe entry, read it back, then remove it.
pub async fn check_health<B: CacheBackend>(backend: &B) -> Result<()> {
    probe(backend, &probe_key()).await
}

async fn probe<B: CacheBackend>(backend: &B, key: &str) -> Result<()> {
    backend
        .set(key, Bytes::from_static(PROBE_VALUE))
        .await
        .map_err(|e| anyhow::anyhow!("backend health check failed on set: {e}"))?;

    let value = backend
        .get(key)
        .await
        .map_err(|e| anyhow::anyhow!("backend health check failed on get: {e}"))?;
    match value {
        Some(v) if v.as_ref() == PROBE_VALUE => {}
        Some(_) => anyhow::bail!("backend health check read back a different value"),
        None => anyhow::bail!("backend health check could not read back its probe"),
    }

    backend
        .delete(key)
        .await
        .map_err(|e| anyhow::anyhow!("backend health check failed on delete: {e}"))
}

/// Returns true if the backend answers the probe, false otherwise (non-panicking)
pub async fn is_healthy<B: CacheBackend>(backend: &B) -> bool {
    check_health(backend).await.is_ok()
}
