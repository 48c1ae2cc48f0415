//! Manifest: the ordered chunk keys of one file, stored under its checksum.
//!
//! Encoding is ASCII, keys joined by `,` with no trailing separator. A file
//! with no chunks has an empty manifest.

use bytes::Bytes;
use fcache_chunks::Checksum;
use std::fmt;
use thiserror::Error;

/// Separator between keys in an encoded manifest
pub const KEY_SEPARATOR: char = ',';

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is not ASCII")]
    NotAscii,

    #[error("entry {index} is '{found}', expected '{expected}'")]
    UnexpectedKey {
        index: usize,
        found: String,
        expected: String,
    },
}

/// Backend key of one chunk: `{checksum}-part-{index}-of-{total}`, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkKey {
    pub checksum: Checksum,
    pub index: usize,
    pub total: usize,
}

impl ChunkKey {
    pub fn new(checksum: Checksum, index: usize, total: usize) -> Self {
        Self {
            checksum,
            index,
            total,
        }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-part-{}-of-{}", self.checksum, self.index, self.total)
    }
}

/// Ordered chunk keys for the file identified by `checksum`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    checksum: Checksum,
    keys: Vec<String>,
}

impl Manifest {
    /// Derive the keys for a file split into `total` chunks.
    pub fn for_chunks(checksum: Checksum, total: usize) -> Self {
        let keys = (0..total)
            .map(|index| ChunkKey::new(checksum, index, total).to_string())
            .collect();
        Self { checksum, keys }
    }

    /// Parse a stored manifest, checking every key follows the naming scheme.
    pub fn decode(checksum: Checksum, data: &[u8]) -> Result<Self, ManifestError> {
        if !data.is_ascii() {
            return Err(ManifestError::NotAscii);
        }
        // ASCII is valid UTF-8
        let text = std::str::from_utf8(data).map_err(|_| ManifestError::NotAscii)?;
        if text.is_empty() {
            return Ok(Self::for_chunks(checksum, 0));
        }

        let found: Vec<&str> = text.split(KEY_SEPARATOR).collect();
        let expected = Self::for_chunks(checksum, found.len());
        for (index, (got, want)) in found.iter().zip(&expected.keys).enumerate() {
            if *got != want.as_str() {
                return Err(ManifestError::UnexpectedKey {
                    index,
                    found: got.to_string(),
                    expected: want.clone(),
                });
            }
        }
        Ok(expected)
    }

    pub fn encode(&self) -> Bytes {
        Bytes::from(self.keys.join(","))
    }

    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    /// Backend key the manifest itself is stored under.
    pub fn key(&self) -> String {
        self.checksum.to_hex()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
