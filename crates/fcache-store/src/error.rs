use fcache_chunks::{Checksum, ChunkError};
use fcache_storage::BackendError;
use std::fmt;
use thiserror::Error;

use crate::manifest::ManifestError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Step of a put or get during which a backend call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading the manifest to detect already-stored content
    PutDedup,
    PutChunk,
    PutManifest,
    GetManifest,
    GetChunk,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::PutDedup => "put-dedup",
            Phase::PutChunk => "put-chunk",
            Phase::PutManifest => "put-manifest",
            Phase::GetManifest => "get-manifest",
            Phase::GetChunk => "get-chunk",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file size {size} exceeds the max allowed {max} by {} bytes", .size - .max)]
    SizeLimitExceeded { size: usize, max: usize },

    #[error("invalid file key '{value}': {reason}")]
    InvalidChecksum { value: String, reason: String },

    #[error("invalid store options: {0}")]
    InvalidOptions(String),

    #[error("file {checksum} not found")]
    NotFound { checksum: String },

    #[error("chunk {key} of file {checksum} not found")]
    ChunkMissing { checksum: String, key: String },

    #[error("checksum mismatch: expected {expected}, assembled content hashes to {actual}")]
    ChecksumMismatch { expected: Checksum, actual: Checksum },

    #[error("corrupt manifest for {checksum}: {source}")]
    CorruptManifest {
        checksum: String,
        #[source]
        source: ManifestError,
    },

    #[error("{phase} failed for key {key}: {source}")]
    Backend {
        phase: Phase,
        key: String,
        #[source]
        source: BackendError,
    },
}

impl From<ChunkError> for StoreError {
    fn from(e: ChunkError) -> Self {
        match e {
            ChunkError::ChecksumMismatch { expected, actual } => {
                StoreError::ChecksumMismatch { expected, actual }
            }
            ChunkError::InvalidChecksum { value, reason } => {
                StoreError::InvalidChecksum { value, reason }
            }
            other @ ChunkError::InvalidBounds { .. } => StoreError::InvalidOptions(other.to_string()),
        }
    }
}

impl StoreError {
    pub(crate) fn backend(phase: Phase, key: &str, source: BackendError) -> Self {
        StoreError::Backend {
            phase,
            key: key.to_string(),
            source,
        }
    }

    /// The file, or one of its chunks, is absent from the backend.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::ChunkMissing { .. }
        )
    }

    /// Phase of the failed backend call, for backend errors.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            StoreError::Backend { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
