//! Simulated annealing over TSP tours.
//!
//! Each iteration swaps two random positions of the working tour and
//! accepts the result if it is shorter than the committed tour, or with
//! the probability given by the configured acceptance function otherwise
//! (Metropolis by default). The temperature decays geometrically. When too
//! many consecutive iterations make no real progress, a restart episode
//! tries a few fresh random tours and adopts the first one that beats the
//! committed tour.
//!
//! The run ends when the temperature reaches its floor or the wall-clock
//! budget runs out; both leave a valid committed tour.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Cerny (1985), "Thermodynamical Approach to the Travelling Salesman Problem"

mod config;
mod runner;

pub use config::{cooling_steps, metropolis, AcceptanceFn, AnnealingConfig};
pub use runner::{AnnealReport, AnnealingEngine, EngineState, StopReason};
