//! fcache-store: stores whole files in a key-value cache as a manifest plus
//! randomly sized chunks, addressed by the checksum of the file's content

pub mod error;
pub mod manifest;
pub mod store;

pub use error::{Phase, StoreError};
pub use manifest::{ChunkKey, Manifest, ManifestError};
pub use store::{ChunkStore, PutResult, StoreOptions};
