//! Key-value cache contract
//!
//! The store only needs three calls. Values larger than the backend's item
//! ceiling are rejected by the backend itself; chunk sizes keep below it.

use bytes::Bytes;
use opendal::{ErrorKind, Operator};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Opendal(#[from] opendal::Error),
}

/// A shared key-value cache with a per-item size ceiling.
pub trait CacheBackend: Send + Sync {
    /// Store or overwrite `key`.
    fn set(&self, key: &str, value: Bytes)
        -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Fetch `key`; `Ok(None)` when the backend does not hold it.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Bytes>, BackendError>> + Send;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), BackendError>> + Send;
}

impl CacheBackend for Operator {
    async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
        self.write(key, value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        match self.read(key).await {
            Ok(buf) => Ok(Some(buf.to_bytes())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        match Operator::delete(self, key).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
