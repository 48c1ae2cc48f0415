use thiserror::Error;

use crate::checksum::Checksum;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("checksum mismatch: expected {expected}, assembled content hashes to {actual}")]
    ChecksumMismatch { expected: Checksum, actual: Checksum },

    #[error("invalid checksum '{value}': {reason}")]
    InvalidChecksum { value: String, reason: String },

    #[error("invalid chunk size bounds: min {min}, max {max} (need 1 <= min <= max)")]
    InvalidBounds { min: usize, max: usize },
}
