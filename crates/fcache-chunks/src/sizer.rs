//! Randomized chunk sizing
//!
//! Chunk sizes are drawn at random rather than fixed so that the chunks of a
//! file land in many of the backend's slab classes instead of piling into one.
//! Boundaries never depend on content.
//!
//! Strategies:
//!   - `uniform`: uniform over [min, max] via a precomputed distribution
//!   - `random`: uniform over [min, max] via `gen_range` (default)
//!   - `skewed`: 80% in [min, 251903], 20% in [251904, max]
//!   - `slab-cumulative`: pick one of 36 slab-like bands, then uniform inside it

use fcache_core::{ChunkStrategy, MAX_CHUNK, MIN_CHUNK};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ChunkError;

/// First size of the upper range drawn by the skewed strategy (246 KiB)
pub const SKEW_PIVOT: usize = 251_904;

/// Share of skewed draws that fall below [`SKEW_PIVOT`]
pub const SKEW_SMALL_SHARE: f64 = 0.8;

/// Size bands modelled on memcached's slab classes (growth factor ~1.25)
pub const SLAB_BANDS: [(usize, usize); 36] = [
    (96, 120),
    (120, 152),
    (152, 192),
    (192, 304),
    (304, 480),
    (480, 752),
    (752, 944),
    (944, 1228),
    (1228, 1433),
    (1433, 1843),
    (1843, 2355),
    (2355, 2867),
    (2867, 3584),
    (3584, 4505),
    (4505, 5632),
    (5632, 7065),
    (7065, 8908),
    (8908, 11059),
    (11059, 13926),
    (13926, 17305),
    (17305, 21708),
    (21708, 27136),
    (27136, 33894),
    (33894, 42393),
    (42393, 52940),
    (52940, 66252),
    (66252, 82841),
    (82841, 103526),
    (103526, 129331),
    (129331, 161689),
    (161689, 202137),
    (202137, 252723),
    (252723, 315904),
    (315904, 394854),
    (394854, 524288),
    (524288, 1048576),
];

/// Produces the length of the next chunk of a file.
pub trait ChunkSizer {
    fn next_chunk_size(&mut self) -> usize;
}

impl<S: ChunkSizer + ?Sized> ChunkSizer for &mut S {
    fn next_chunk_size(&mut self) -> usize {
        (**self).next_chunk_size()
    }
}

impl<S: ChunkSizer + ?Sized> ChunkSizer for Box<S> {
    fn next_chunk_size(&mut self) -> usize {
        (**self).next_chunk_size()
    }
}

/// Inclusive chunk size range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBounds {
    min: usize,
    max: usize,
}

impl SizeBounds {
    /// Default bounds: 96 bytes to 1 MiB
    pub const DEFAULT: SizeBounds = SizeBounds {
        min: MIN_CHUNK,
        max: MAX_CHUNK,
    };

    pub fn new(min: usize, max: usize) -> Result<Self, ChunkError> {
        if min == 0 || min > max {
            return Err(ChunkError::InvalidBounds { min, max });
        }
        Ok(SizeBounds { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn contains(&self, size: usize) -> bool {
        (self.min..=self.max).contains(&size)
    }
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The four random strategies behind one [`ChunkSizer`].
///
/// The only state is the random source, plus the band table for
/// `slab-cumulative` which is fixed at construction.
#[derive(Debug, Clone)]
pub struct RandomSizer<R = StdRng> {
    strategy: ChunkStrategy,
    bounds: SizeBounds,
    uniform: Uniform<usize>,
    bands: Vec<(usize, usize)>,
    rng: R,
}

impl RandomSizer<StdRng> {
    /// Seeded from OS entropy.
    pub fn from_entropy(strategy: ChunkStrategy, bounds: SizeBounds) -> Self {
        Self::with_rng(strategy, bounds, StdRng::from_entropy())
    }

    /// Deterministic sequence for a given seed.
    pub fn seeded(strategy: ChunkStrategy, bounds: SizeBounds, seed: u64) -> Self {
        Self::with_rng(strategy, bounds, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSizer<R> {
    pub fn with_rng(strategy: ChunkStrategy, bounds: SizeBounds, rng: R) -> Self {
        Self {
            strategy,
            bounds,
            uniform: Uniform::new_inclusive(bounds.min, bounds.max),
            bands: slab_bands_within(bounds),
            rng,
        }
    }

    pub fn strategy(&self) -> ChunkStrategy {
        self.strategy
    }

    pub fn bounds(&self) -> SizeBounds {
        self.bounds
    }

    fn skewed(&mut self) -> usize {
        let SizeBounds { min, max } = self.bounds;
        if SKEW_PIVOT <= min || SKEW_PIVOT > max {
            return self.uniform.sample(&mut self.rng);
        }
        if self.rng.gen_bool(SKEW_SMALL_SHARE) {
            self.rng.gen_range(min..SKEW_PIVOT)
        } else {
            self.rng.gen_range(SKEW_PIVOT..=max)
        }
    }

    fn slab_cumulative(&mut self) -> usize {
        let (start, end) = self.bands[self.rng.gen_range(0..self.bands.len())];
        self.rng.gen_range(start..=end)
    }
}

impl<R: Rng> ChunkSizer for RandomSizer<R> {
    fn next_chunk_size(&mut self) -> usize {
        match self.strategy {
            ChunkStrategy::Uniform => self.uniform.sample(&mut self.rng),
            ChunkStrategy::Random => self.rng.gen_range(self.bounds.min..=self.bounds.max),
            ChunkStrategy::Skewed => self.skewed(),
            ChunkStrategy::SlabCumulative => self.slab_cumulative(),
        }
    }
}

/// Clip the slab table to `bounds`, never returning an empty table.
fn slab_bands_within(bounds: SizeBounds) -> Vec<(usize, usize)> {
    let bands: Vec<(usize, usize)> = SLAB_BANDS
        .iter()
        .filter(|(start, end)| *end >= bounds.min && *start <= bounds.max)
        .map(|(start, end)| ((*start).max(bounds.min), (*end).min(bounds.max)))
        .collect();

    if bands.is_empty() {
        vec![(bounds.min, bounds.max)]
    } else {
        bands
    }
}

/// Replays a fixed list of sizes, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceSizer {
    sizes: Vec<usize>,
    next: usize,
}

impl SequenceSizer {
    /// # Panics
    /// If `sizes` is empty.
    pub fn new(sizes: impl Into<Vec<usize>>) -> Self {
        let sizes = sizes.into();
        assert!(!sizes.is_empty(), "SequenceSizer needs at least one size");
        Self { sizes, next: 0 }
    }
}

impl ChunkSizer for SequenceSizer {
    fn next_chunk_size(&mut self) -> usize {
        let size = self.sizes[self.next % self.sizes.len()];
        self.next += 1;
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAWS: usize = 2_000;

    fn draws(strategy: ChunkStrategy, bounds: SizeBounds, seed: u64) -> Vec<usize> {
        let mut sizer = RandomSizer::seeded(strategy, bounds, seed);
        (0..DRAWS).map(|_| sizer.next_chunk_size()).collect()
    }

    #[test]
    fn every_strategy_stays_within_default_bounds() {
        for strategy in ChunkStrategy::ALL {
            for size in draws(strategy, SizeBounds::DEFAULT, 7) {
                assert!(
                    SizeBounds::DEFAULT.contains(size),
                    "{strategy} produced {size}, outside [{MIN_CHUNK}, {MAX_CHUNK}]"
                );
            }
        }
    }

    #[test]
    fn every_strategy_respects_narrow_bounds() {
        let bounds = SizeBounds::new(96, 1024).unwrap();
        for strategy in ChunkStrategy::ALL {
            for size in draws(strategy, bounds, 11) {
                assert!(bounds.contains(size), "{strategy} produced {size}");
            }
        }
    }

    #[test]
    fn entropy_sizer_stays_within_bounds() {
        let mut sizer = RandomSizer::from_entropy(ChunkStrategy::Random, SizeBounds::DEFAULT);
        for _ in 0..100 {
            assert!(SizeBounds::DEFAULT.contains(sizer.next_chunk_size()));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        for strategy in ChunkStrategy::ALL {
            assert_eq!(
                draws(strategy, SizeBounds::DEFAULT, 42),
                draws(strategy, SizeBounds::DEFAULT, 42)
            );
        }
    }

    #[test]
    fn skewed_favours_small_chunks() {
        let small = draws(ChunkStrategy::Skewed, SizeBounds::DEFAULT, 3)
            .into_iter()
            .filter(|s| *s < SKEW_PIVOT)
            .count();
        let share = small as f64 / DRAWS as f64;
        assert!(
            (0.74..=0.86).contains(&share),
            "expected ~80% small chunks, got {:.1}%",
            share * 100.0
        );
    }

    #[test]
    fn skewed_degenerates_to_uniform_when_pivot_outside_bounds() {
        let bounds = SizeBounds::new(96, 4096).unwrap();
        for size in draws(ChunkStrategy::Skewed, bounds, 5) {
            assert!(bounds.contains(size));
        }
    }

    #[test]
    fn slab_cumulative_reaches_many_bands() {
        let sizes = draws(ChunkStrategy::SlabCumulative, SizeBounds::DEFAULT, 9);
        let hit = SLAB_BANDS
            .iter()
            .filter(|(start, end)| sizes.iter().any(|s| (*start..=*end).contains(s)))
            .count();
        // 2000 draws over 36 equally likely bands
        assert!(hit >= 30, "only {hit} of 36 bands drawn");

        let tiny = sizes.iter().filter(|s| **s < 1024).count();
        assert!(tiny > DRAWS / 10, "small bands should be drawn often, got {tiny}");
    }

    #[test]
    fn slab_bands_clip_to_bounds() {
        let bounds = SizeBounds::new(100, 200).unwrap();
        let bands = slab_bands_within(bounds);
        assert_eq!(bands, vec![(100, 120), (120, 152), (152, 192), (192, 200)]);

        let outside = SizeBounds::new(2_000_000, 3_000_000).unwrap();
        assert_eq!(slab_bands_within(outside), vec![(2_000_000, 3_000_000)]);
    }

    #[test]
    fn slab_table_is_contiguous() {
        assert_eq!(SLAB_BANDS[0].0, MIN_CHUNK);
        assert_eq!(SLAB_BANDS[SLAB_BANDS.len() - 1].1, MAX_CHUNK);
        for pair in SLAB_BANDS.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn bounds_validation() {
        assert!(SizeBounds::new(0, 10).is_err());
        assert!(SizeBounds::new(11, 10).is_err());
        assert!(SizeBounds::new(10, 10).is_ok());
    }

    #[test]
    fn sequence_sizer_cycles() {
        let mut sizer = SequenceSizer::new(vec![1, 2, 3]);
        let got: Vec<usize> = (0..7).map(|_| sizer.next_chunk_size()).collect();
        assert_eq!(got, vec![1, 2, 3, 1, 2, 3, 1]);
    }
}
