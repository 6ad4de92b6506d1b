//! Injectable random source used for scenario picks and reply selection.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Picks an index in `0..upper`. Implemented for every [`rand::Rng`], so a
/// seeded [`StdRng`] gives reproducible sessions in tests.
pub trait RandomSource: Send {
    /// `upper` must be greater than zero.
    fn next_index(&mut self, upper: usize) -> usize;
}

impl<R: Rng + Send> RandomSource for R {
    fn next_index(&mut self, upper: usize) -> usize {
        self.random_range(0..upper)
    }
}

/// A deterministic source for the given seed.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A source seeded from the operating system.
pub fn from_entropy() -> StdRng {
    StdRng::from_os_rng()
}
