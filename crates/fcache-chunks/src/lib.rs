//! fcache-chunks: randomized chunking and whole-file checksums
//!
//! # Overview
//! - `sizer`: chunk size strategies (uniform, random, skewed, slab-cumulative)
//! - `file`: split a file into chunks, assemble it back, validate its checksum
//! - `checksum`: BLAKE3 digest of a whole file, the file's public identifier

pub mod checksum;
pub mod chunk;
pub mod error;
pub mod file;
pub mod sizer;

// Convenience re-exports for the most common operations
pub use checksum::{Checksum, CHECKSUM_HEX_LEN};
pub use chunk::Chunk;
pub use error::ChunkError;
pub use file::{assemble, split, ChunkedFile};
pub use sizer::{ChunkSizer, RandomSizer, SequenceSizer, SizeBounds};
