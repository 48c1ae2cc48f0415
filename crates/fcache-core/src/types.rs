use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest chunk the sizers produce (fits memcached's smallest slab class)
pub const MIN_CHUNK: usize = 96;

/// Largest chunk the sizers produce (1 MiB, memcached's default item ceiling)
pub const MAX_CHUNK: usize = 1024 * 1024;

/// Largest file accepted by a put (50 MiB)
pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Distribution used to draw successive chunk sizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkStrategy {
    /// Uniform over [min, max] through a precomputed distribution
    Uniform,
    /// Uniform over [min, max] drawn directly from the generator
    #[default]
    Random,
    /// 80% small chunks, 20% chunks above 246 KiB
    Skewed,
    /// Uniform over memcached-like slab bands, then uniform within the band
    SlabCumulative,
}

impl ChunkStrategy {
    pub const ALL: [ChunkStrategy; 4] = [
        ChunkStrategy::Uniform,
        ChunkStrategy::Random,
        ChunkStrategy::Skewed,
        ChunkStrategy::SlabCumulative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStrategy::Uniform => "uniform",
            ChunkStrategy::Random => "random",
            ChunkStrategy::Skewed => "skewed",
            ChunkStrategy::SlabCumulative => "slab-cumulative",
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChunkStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown chunk strategy '{s}' (expected uniform, random, skewed or slab-cumulative)"
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_backend_limits() {
        assert_eq!(MIN_CHUNK, 96);
        assert_eq!(MAX_CHUNK, 1_048_576);
        assert_eq!(MAX_FILE_SIZE, 52_428_800);
    }

    #[test]
    fn strategy_names_roundtrip() {
        for strategy in ChunkStrategy::ALL {
            let parsed: ChunkStrategy = strategy.as_str().parse().unwrap();
            assert_eq!(parsed, strategy);
        }
        assert!("fastcdc".parse::<ChunkStrategy>().is_err());
    }

    #[test]
    fn default_strategy_is_random() {
        assert_eq!(ChunkStrategy::default(), ChunkStrategy::Random);
    }
}
