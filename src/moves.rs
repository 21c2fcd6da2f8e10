//! Random perturbations of a [`Tour`].

use crate::dataset::VertexDataset;
use crate::error::{Error, Result};
use crate::random::RandomIndexGenerator;
use crate::tour::Tour;

/// Produces random two-position swaps and random shuffles.
///
/// Positions are drawn from the generator's range. When both draws land
/// on the same position the second one is shifted so that every swap on a
/// tour of two or more vertices changes the order:
///
/// - single steps ([`random_swap`](MoveGenerator::random_swap)) move it one
///   step back, or forward from position 1, and never leave the range
///   `1..=n-1` for `n >= 3`;
/// - shuffles ([`apply_swaps`](MoveGenerator::apply_swaps)) move it one step
///   forward with wrap-around, so they can also reach position 0.
#[derive(Debug, Clone)]
pub struct MoveGenerator {
    indices: RandomIndexGenerator,
    vertex_count: usize,
}

impl MoveGenerator {
    /// Swaps drawn from `1..=vertex_count - 1`. Single steps keep position 0
    /// fixed (except for two-vertex tours, whose only swap is `(1, 0)`);
    /// shuffles reach it through the wrap-around shift.
    ///
    /// Tours of a single vertex get the range `0..=0`, which yields no-op swaps.
    pub fn new(vertex_count: usize, seed: Option<u64>) -> Result<Self> {
        if vertex_count < 2 {
            return Self::with_range(vertex_count, 0, 0, seed);
        }
        Self::with_range(vertex_count, 1, vertex_count - 1, seed)
    }

    /// Swaps drawn from an explicit inclusive position range.
    pub fn with_range(vertex_count: usize, low: usize, high: usize, seed: Option<u64>) -> Result<Self> {
        if vertex_count == 0 {
            return Err(Error::invalid_argument("vertex count must be positive"));
        }
        if high >= vertex_count {
            return Err(Error::IndexOutOfRange {
                index: high,
                len: vertex_count,
            });
        }
        Ok(Self {
            indices: RandomIndexGenerator::new(low, high, seed)?,
            vertex_count,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Draws the positions of a single step without applying it.
    pub fn draw_pair(&mut self) -> (usize, usize) {
        let n = self.vertex_count;
        let a = self.indices.sample();
        let mut b = self.indices.sample();
        if a == b {
            b = if b > 1 {
                b - 1
            } else if b + 1 < n {
                b + 1
            } else {
                (b + 1) % n
            };
        }
        (a, b)
    }

    /// Draws the positions of one shuffle swap without applying it.
    pub fn draw_shuffle_pair(&mut self) -> (usize, usize) {
        let a = self.indices.sample();
        let mut b = self.indices.sample();
        if a == b {
            b = (b + 1) % self.vertex_count;
        }
        (a, b)
    }

    /// Applies one random swap and returns the positions so it can be undone.
    pub fn random_swap(&mut self, dataset: &VertexDataset, tour: &mut Tour) -> Result<(usize, usize)> {
        let (a, b) = self.draw_pair();
        tour.swap(dataset, a, b)?;
        Ok((a, b))
    }

    /// Applies `swap_count` random swaps to `tour`.
    pub fn apply_swaps(&mut self, dataset: &VertexDataset, tour: &mut Tour, swap_count: usize) -> Result<()> {
        if swap_count == 0 {
            return Err(Error::invalid_argument("swap count must be positive"));
        }
        for _ in 0..swap_count {
            let (a, b) = self.draw_shuffle_pair();
            tour.swap(dataset, a, b)?;
        }
        Ok(())
    }

    /// A canonical tour scrambled by `swap_count` random swaps.
    pub fn random_shuffle(&mut self, dataset: &VertexDataset, swap_count: usize) -> Result<Tour> {
        let mut tour = Tour::canonical(dataset);
        self.apply_swaps(dataset, &mut tour, swap_count)?;
        Ok(tour)
    }
}
