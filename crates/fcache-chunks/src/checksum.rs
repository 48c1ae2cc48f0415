//! BLAKE3 whole-file checksums
//!
//! The checksum of a file's complete content is its public identifier and the
//! key its manifest is stored under. Chunks are never hashed individually.

use std::fmt;
use std::str::FromStr;

use crate::error::ChunkError;

/// Length of a checksum rendered as lowercase hex
pub const CHECKSUM_HEX_LEN: usize = 64;

/// A BLAKE3 digest of a whole file, displayed as 64 lowercase hex chars
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum(blake3::Hash);

impl Checksum {
    /// Hash a complete file held in memory.
    pub fn of(data: &[u8]) -> Self {
        Checksum(blake3::hash(data))
    }

    /// Hash a file delivered as ordered pieces, without concatenating them.
    pub fn of_parts<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Checksum(hasher.finalize())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl FromStr for Checksum {
    type Err = ChunkError;

    fn from_str(hex: &str) -> Result<Self, Self::Err> {
        if hex.len() != CHECKSUM_HEX_LEN {
            return Err(ChunkError::InvalidChecksum {
                value: hex.to_string(),
                reason: format!("expected {CHECKSUM_HEX_LEN} hex chars, got {}", hex.len()),
            });
        }
        // Manifest keys are the lowercase form; accepting uppercase would
        // address a different key for the same content.
        if hex.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(ChunkError::InvalidChecksum {
                value: hex.to_string(),
                reason: "must be lowercase hex".into(),
            });
        }
        blake3::Hash::from_hex(hex)
            .map(Checksum)
            .map_err(|e| ChunkError::InvalidChecksum {
                value: hex.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.to_hex().as_str())
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.0.to_hex())
    }
}
