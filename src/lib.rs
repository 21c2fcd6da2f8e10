//! Euclidean TSP approximation by simulated annealing.
//!
//! Given 2-D points and a wall-clock budget, the [`AnnealingEngine`]
//! searches for a short closed tour and returns the best committed tour
//! when the temperature reaches its floor or the budget runs out.
//!
//! - [`dataset`]: problem text parsing and the vertex table with its metric.
//! - [`tour`]: cyclic tour with O(1) length updates on swaps.
//! - [`moves`] and [`random`]: random swaps and shuffles.
//! - [`deadline`]: wall-clock budget tracking.
//! - [`anneal`]: configuration and the annealing loop.
//! - [`output`]: printing the final tour.
//!
//! # Examples
//!
//! ```
//! use tsp_anneal::anneal::{AnnealingConfig, AnnealingEngine};
//! use tsp_anneal::output::write_solution;
//!
//! let text = "3\n1 0 0\n2 3 0\n3 0 4\n2\n";
//! let mut engine = AnnealingEngine::from_reader(text.as_bytes(), AnnealingConfig::default()).unwrap();
//! engine.run().unwrap();
//!
//! let mut out = Vec::new();
//! write_solution(&mut out, engine.best()).unwrap();
//! assert!(String::from_utf8(out).unwrap().starts_with("12"));
//! ```
//!
//! [`AnnealingEngine`]: anneal::AnnealingEngine

pub mod anneal;
pub mod dataset;
pub mod deadline;
pub mod error;
pub mod logging;
pub mod moves;
pub mod output;
pub mod random;
pub mod tour;

pub use error::{Error, Result};
