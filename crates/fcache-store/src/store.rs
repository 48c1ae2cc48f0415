//! Chunk store: put and get whole files through a size-limited cache
//!
//!   - `put`: size check → checksum → skip if manifest exists → split →
//!     write chunks → write manifest
//!   - `get`: read manifest → read chunks in order → reassemble → verify
//!
//! Chunks are written before the manifest, so a manifest is only ever visible
//! once every chunk it names has been stored. A put that fails part-way
//! leaves its already-written chunks behind; without a manifest they are
//! unreachable and expire with the backend's eviction.

use bytes::Bytes;
use fcache_chunks::{Checksum, Chunk, ChunkSizer, ChunkedFile, RandomSizer, SizeBounds};
use fcache_core::{ChunkStrategy, FcacheConfig, MAX_FILE_SIZE};
use fcache_storage::CacheBackend;
use tracing::{debug, info, warn};

use crate::error::{Phase, StoreError, StoreResult};
use crate::manifest::Manifest;

/// How files are split and how large they may be
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub strategy: ChunkStrategy,
    pub bounds: SizeBounds,
    pub max_file_size: usize,
    /// Fixed RNG seed; every put then splits identical input identically
    pub seed: Option<u64>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Random,
            bounds: SizeBounds::DEFAULT,
            max_file_size: MAX_FILE_SIZE,
            seed: None,
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &FcacheConfig) -> StoreResult<Self> {
        if config.limits.max_file_size == 0 {
            return Err(StoreError::InvalidOptions(
                "max_file_size must be greater than 0".into(),
            ));
        }
        Ok(Self {
            strategy: config.chunking.strategy,
            bounds: SizeBounds::new(config.chunking.min_chunk, config.chunking.max_chunk)?,
            max_file_size: config.limits.max_file_size,
            seed: config.chunking.seed,
        })
    }
}

/// Result of storing a single file
#[derive(Debug, Clone)]
pub struct PutResult {
    /// Public identifier of the file
    pub checksum: Checksum,
    pub chunks: usize,
    pub bytes: u64,
    /// true if the content was already stored and nothing was written
    pub deduplicated: bool,
}

/// Stores files as a manifest plus chunks in a [`CacheBackend`].
///
/// Holds no mutable state; one store can serve many concurrent calls.
#[derive(Debug)]
pub struct ChunkStore<B> {
    backend: B,
    options: StoreOptions,
}

impl<B: CacheBackend> ChunkStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, StoreOptions::default())
    }

    pub fn with_options(backend: B, options: StoreOptions) -> Self {
        Self { backend, options }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    fn sizer(&self) -> RandomSizer {
        let StoreOptions {
            strategy,
            bounds,
            seed,
            ..
        } = self.options;
        match seed {
            Some(seed) => RandomSizer::seeded(strategy, bounds, seed),
            None => RandomSizer::from_entropy(strategy, bounds),
        }
    }

    /// Store `data`, returning its checksum.
    ///
    /// Content that is already stored is not written again.
    pub async fn put(&self, data: impl Into<Bytes>) -> StoreResult<PutResult> {
        let mut sizer = self.sizer();
        self.put_with_sizer(data, &mut sizer).await
    }

    /// [`ChunkStore::put`] with an explicit chunk sizer.
    pub async fn put_with_sizer<S: ChunkSizer + ?Sized>(
        &self,
        data: impl Into<Bytes>,
        sizer: &mut S,
    ) -> StoreResult<PutResult> {
        let data = data.into();
        if data.len() > self.options.max_file_size {
            return Err(StoreError::SizeLimitExceeded {
                size: data.len(),
                max: self.options.max_file_size,
            });
        }

        let file = ChunkedFile::from_file(data);
        let checksum = file.checksum();
        let manifest_key = checksum.to_hex();

        let existing = self
            .backend
            .get(&manifest_key)
            .await
            .map_err(|e| StoreError::backend(Phase::PutDedup, &manifest_key, e))?;
        if let Some(existing) = existing {
            match Manifest::decode(checksum, &existing) {
                Ok(manifest) => {
                    debug!(checksum = %checksum, "dedup: manifest already exists");
                    return Ok(PutResult {
                        checksum,
                        chunks: manifest.len(),
                        bytes: file.len() as u64,
                        deduplicated: true,
                    });
                }
                Err(e) => {
                    warn!(checksum = %checksum, "replacing corrupt manifest: {e}");
                }
            }
        }

        let chunks = file.split(sizer);
        let manifest = Manifest::for_chunks(checksum, chunks.len());

        for (i, (key, chunk)) in manifest.keys().iter().zip(&chunks).enumerate() {
            if let Err(e) = self.backend.set(key, chunk.bytes().clone()).await {
                if i > 0 {
                    warn!(
                        checksum = %checksum,
                        orphaned = i,
                        "put failed part-way; chunks already written are left behind"
                    );
                }
                return Err(StoreError::backend(Phase::PutChunk, key, e));
            }
            debug!(key = %key, bytes = chunk.len(), "chunk stored");
        }

        if let Err(e) = self.backend.set(&manifest_key, manifest.encode()).await {
            // The failed set may still have reached the backend
            if let Err(delete_err) = self.backend.delete(&manifest_key).await {
                warn!(checksum = %checksum, "failed to roll back manifest: {delete_err}");
            }
            return Err(StoreError::backend(Phase::PutManifest, &manifest_key, e));
        }

        info!(
            checksum = %checksum,
            chunks = chunks.len(),
            bytes = file.len(),
            "stored"
        );

        Ok(PutResult {
            checksum,
            chunks: chunks.len(),
            bytes: file.len() as u64,
            deduplicated: false,
        })
    }

    /// Fetch and verify the file identified by `checksum`.
    pub async fn get(&self, checksum: &str) -> StoreResult<Bytes> {
        let expected: Checksum = checksum.parse()?;
        let manifest_key = expected.to_hex();

        let raw = self
            .backend
            .get(&manifest_key)
            .await
            .map_err(|e| StoreError::backend(Phase::GetManifest, &manifest_key, e))?
            .ok_or_else(|| StoreError::NotFound {
                checksum: manifest_key.clone(),
            })?;

        let manifest =
            Manifest::decode(expected, &raw).map_err(|source| StoreError::CorruptManifest {
                checksum: manifest_key.clone(),
                source,
            })?;

        let mut chunks = Vec::with_capacity(manifest.len());
        for key in manifest.keys() {
            let bytes = self
                .backend
                .get(key)
                .await
                .map_err(|e| StoreError::backend(Phase::GetChunk, key, e))?
                .ok_or_else(|| StoreError::ChunkMissing {
                    checksum: manifest_key.clone(),
                    key: key.clone(),
                })?;
            debug!(key = %key, bytes = bytes.len(), "chunk fetched");
            chunks.push(Chunk::new(bytes));
        }

        let file = ChunkedFile::from_chunks(chunks);
        file.validate(&expected)?;

        info!(
            checksum = %expected,
            chunks = manifest.len(),
            bytes = file.len(),
            "fetched"
        );
        Ok(file.file())
    }
}
