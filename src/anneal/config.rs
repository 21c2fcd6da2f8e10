//! Annealing configuration and cooling arithmetic.

use crate::dataset::{euclidean, DistanceFn};
use crate::error::{Error, Result};

/// Probability of accepting a move, given `(new_length, old_length, temperature)`.
pub type AcceptanceFn = fn(f64, f64, f64) -> f64;

/// Metropolis criterion on tour length: `exp(-(new - old) / T)`.
///
/// Values above 1 (improving or equal moves) are always accepted by the
/// uniform draw.
pub fn metropolis(new_length: f64, old_length: f64, temperature: f64) -> f64 {
    (-(new_length - old_length) / temperature).exp()
}

/// Configuration for the [`AnnealingEngine`](super::AnnealingEngine).
///
/// # Examples
///
/// ```
/// use tsp_anneal::anneal::AnnealingConfig;
///
/// let config = AnnealingConfig::default()
///     .with_initial_temperature(1e4)
///     .with_min_temperature(1e-3)
///     .with_cooling_factor(0.999)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct AnnealingConfig {
    /// Metric between two coordinates.
    pub distance: DistanceFn,

    /// Acceptance probability for non-improving moves.
    pub acceptance: AcceptanceFn,

    /// Temperature floor. The run stops once the temperature is at or below it.
    pub min_temperature: f64,

    /// Starting temperature.
    pub initial_temperature: f64,

    /// Multiplicative decay applied once per iteration, in (0, 1).
    pub cooling_factor: f64,

    /// Relative length change below which an accepted move does not count
    /// as progress.
    pub stagnation_threshold: f64,

    /// Non-progress iterations tolerated before a restart episode.
    pub stagnation_reset: usize,

    /// Random shuffles tried per restart episode.
    pub restart_attempts: usize,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            distance: euclidean,
            acceptance: metropolis,
            min_temperature: 1e-30,
            initial_temperature: 1e16,
            cooling_factor: 0.97,
            stagnation_threshold: 0.05,
            stagnation_reset: 10,
            restart_attempts: 5,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    pub fn with_distance(mut self, distance: DistanceFn) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_acceptance(mut self, acceptance: AcceptanceFn) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_cooling_factor(mut self, factor: f64) -> Self {
        self.cooling_factor = factor;
        self
    }

    pub fn with_stagnation_threshold(mut self, threshold: f64) -> Self {
        self.stagnation_threshold = threshold;
        self
    }

    pub fn with_stagnation_reset(mut self, n: usize) -> Self {
        self.stagnation_reset = n;
        self
    }

    pub fn with_restart_attempts(mut self, n: usize) -> Self {
        self.restart_attempts = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(Error::invalid_argument(format!(
                "initial_temperature must be positive and finite, got {}",
                self.initial_temperature
            )));
        }
        if !(self.min_temperature.is_finite() && self.min_temperature >= 0.0) {
            return Err(Error::invalid_argument(format!(
                "min_temperature must be non-negative and finite, got {}",
                self.min_temperature
            )));
        }
        if self.min_temperature >= self.initial_temperature {
            return Err(Error::invalid_argument(
                "min_temperature must be less than initial_temperature",
            ));
        }
        if !(self.cooling_factor > 0.0 && self.cooling_factor < 1.0) {
            return Err(Error::invalid_argument(format!(
                "cooling_factor must be in (0, 1), got {}",
                self.cooling_factor
            )));
        }
        if !(self.stagnation_threshold.is_finite() && self.stagnation_threshold >= 0.0) {
            return Err(Error::invalid_argument(format!(
                "stagnation_threshold must be non-negative and finite, got {}",
                self.stagnation_threshold
            )));
        }
        if self.stagnation_reset == 0 {
            return Err(Error::invalid_argument("stagnation_reset must be at least 1"));
        }
        Ok(())
    }
}

/// Number of cooling steps the engine takes before its temperature is at
/// or below `floor`.
///
/// Temperatures are multiplied step by step exactly as the engine does, so
/// rounding at the boundary is counted the same way (`1.0 * 0.1^3` is still
/// above `0.001` in floating point). The cost is linear in the result.
///
/// Returns `None` when the floor is not positive, the initial temperature is
/// not finite, or the factor is outside (0, 1).
///
/// ```
/// use tsp_anneal::anneal::cooling_steps;
///
/// assert_eq!(cooling_steps(100.0, 1.0, 0.9), Some(44));
/// assert_eq!(cooling_steps(1.0, 0.001, 0.1), Some(4));
/// assert_eq!(cooling_steps(1.0, 2.0, 0.9), Some(0));
/// ```
pub fn cooling_steps(initial: f64, floor: f64, factor: f64) -> Option<usize> {
    if !(factor > 0.0 && factor < 1.0) || floor <= 0.0 || !initial.is_finite() {
        return None;
    }
    let mut temperature = initial;
    let mut steps = 0;
    while temperature > floor {
        temperature *= factor;
        steps += 1;
    }
    Some(steps)
}
