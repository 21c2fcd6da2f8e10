//! Bounded uniform integer sampling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Uniform sampler over a fixed inclusive range of positions.
#[derive(Debug, Clone)]
pub struct RandomIndexGenerator {
    rng: StdRng,
    low: usize,
    high: usize,
}

impl RandomIndexGenerator {
    /// Creates a sampler over `low..=high`. Without a seed the generator is
    /// seeded from the thread-local RNG.
    pub fn new(low: usize, high: usize, seed: Option<u64>) -> Result<Self> {
        if low > high {
            return Err(Error::invalid_argument(format!(
                "empty index range {low}..={high}"
            )));
        }
        let rng = StdRng::seed_from_u64(seed.unwrap_or_else(rand::random));
        Ok(Self { rng, low, high })
    }

    pub fn low(&self) -> usize {
        self.low
    }

    pub fn high(&self) -> usize {
        self.high
    }

    /// Draws one index.
    pub fn sample(&mut self) -> usize {
        self.rng.random_range(self.low..=self.high)
    }
}
