pub mod config;
pub mod error;
pub mod types;

pub use config::FcacheConfig;
pub use error::{FcacheError, FcacheResult};
pub use types::{ChunkStrategy, MAX_CHUNK, MAX_FILE_SIZE, MIN_CHUNK};
