//! Splitting a file into chunks and putting it back together
//!
//! A [`ChunkedFile`] holds either the whole file or its ordered chunks. The
//! other form and the checksum are derived at most once and cached.

use bytes::{Bytes, BytesMut};
use std::sync::OnceLock;

use crate::checksum::Checksum;
use crate::chunk::Chunk;
use crate::error::ChunkError;
use crate::sizer::ChunkSizer;

/// Split `data` into consecutive chunks sized by `sizer`.
///
/// Each candidate size is clamped to the bytes remaining, so every chunk but
/// the last has a size the sizer produced. Empty input yields no chunks.
pub fn split<S: ChunkSizer + ?Sized>(data: &Bytes, sizer: &mut S) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let length = sizer.next_chunk_size().max(1).min(data.len() - offset);
        chunks.push(Chunk::new(data.slice(offset..offset + length)));
        offset += length;
    }
    chunks
}

/// Concatenate chunks in order.
pub fn assemble(chunks: &[Chunk]) -> Bytes {
    match chunks {
        [] => Bytes::new(),
        [only] => only.bytes().clone(),
        _ => {
            let total = chunks.iter().map(Chunk::len).sum();
            let mut out = BytesMut::with_capacity(total);
            for chunk in chunks {
                out.extend_from_slice(chunk.bytes());
            }
            out.freeze()
        }
    }
}

#[derive(Debug)]
enum Source {
    Whole(Bytes),
    Parts {
        chunks: Vec<Chunk>,
        assembled: OnceLock<Bytes>,
    },
}

/// A file paired with its chunk decomposition and content checksum.
#[derive(Debug)]
pub struct ChunkedFile {
    source: Source,
    checksum: OnceLock<Checksum>,
}

impl ChunkedFile {
    /// Wrap a whole file; chunks are produced by [`ChunkedFile::split`].
    pub fn from_file(data: impl Into<Bytes>) -> Self {
        Self {
            source: Source::Whole(data.into()),
            checksum: OnceLock::new(),
        }
    }

    /// Wrap the ordered chunks of a file fetched piecewise.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self {
            source: Source::Parts {
                chunks,
                assembled: OnceLock::new(),
            },
            checksum: OnceLock::new(),
        }
    }

    /// Total file length in bytes.
    pub fn len(&self) -> usize {
        match &self.source {
            Source::Whole(data) => data.len(),
            Source::Parts { chunks, .. } => chunks.iter().map(Chunk::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checksum of the whole assembled file, computed once.
    pub fn checksum(&self) -> Checksum {
        *self.checksum.get_or_init(|| match &self.source {
            Source::Whole(data) => Checksum::of(data),
            Source::Parts { chunks, .. } => {
                Checksum::of_parts(chunks.iter().map(|c| &c.bytes()[..]))
            }
        })
    }

    /// Ordered chunks of the file.
    ///
    /// A whole file is cut with `sizer`; a file built from chunks returns
    /// those chunks and ignores `sizer`.
    pub fn split<S: ChunkSizer + ?Sized>(&self, sizer: &mut S) -> Vec<Chunk> {
        match &self.source {
            Source::Whole(data) => split(data, sizer),
            Source::Parts { chunks, .. } => chunks.clone(),
        }
    }

    /// The whole file. Chunks are concatenated on first use only.
    pub fn file(&self) -> Bytes {
        match &self.source {
            Source::Whole(data) => data.clone(),
            Source::Parts { chunks, assembled } => {
                assembled.get_or_init(|| assemble(chunks)).clone()
            }
        }
    }

    /// Check the assembled content against `expected`.
    pub fn validate(&self, expected: &Checksum) -> Result<(), ChunkError> {
        let actual = self.checksum();
        if actual != *expected {
            return Err(ChunkError::ChecksumMismatch {
                expected: *expected,
                actual,
            });
        }
        Ok(())
    }
}
