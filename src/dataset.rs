//! Problem input: vertex coordinates, distance metric and time budget.
//!
//! The textual format is a whitespace-separated token stream:
//!
//! ```text
//! <vertex_count>
//! <index> <x> <y>      (vertex_count records, index is 1-based)
//! <time_budget_secs>
//! ```

use std::io::Read;
use std::str::{FromStr, SplitWhitespace};

use crate::error::{Error, Result};

/// A 2-D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Metric between two coordinates. Must be symmetric and non-negative.
pub type DistanceFn = fn(Point, Point) -> f64;

/// Straight-line distance.
///
/// ```
/// use tsp_anneal::dataset::{euclidean, Point};
///
/// let d = euclidean(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
/// assert!((d - 5.0).abs() < 1e-12);
/// ```
pub fn euclidean(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Parsed problem text, before a metric is attached.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemInput {
    /// Coordinates in vertex order; vertex `i` is stored at `points[i - 1]`.
    pub points: Vec<Point>,
    /// Wall-clock budget in seconds.
    pub time_budget_secs: u64,
}

impl ProblemInput {
    /// Builds an input from coordinates already in vertex order.
    pub fn new(points: Vec<Point>, time_budget_secs: u64) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::invalid_input("vertex count must be positive"));
        }
        if time_budget_secs == 0 {
            return Err(Error::invalid_input("time budget must be positive"));
        }
        Ok(Self {
            points,
            time_budget_secs,
        })
    }

    /// Reads the whole stream and parses it.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    /// Parses problem text. Tokens after the time budget are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut tokens = text.split_whitespace();

        let declared: i64 = next_token(&mut tokens, "vertex count")?;
        if declared <= 0 {
            return Err(Error::invalid_input(format!(
                "vertex count must be positive, got {declared}"
            )));
        }
        let count = declared as usize;
        let records = tokens.clone().count() / 3;
        if records < count {
            return Err(Error::invalid_input(format!(
                "expected {count} coordinate records, found {records}"
            )));
        }

        let mut slots: Vec<Option<Point>> = vec![None; count];
        for record in 0..count {
            let Some(raw_index) = tokens.next() else {
                return Err(Error::invalid_input(format!(
                    "expected {count} coordinate records, found {record}"
                )));
            };
            let index: usize = parse_token(raw_index, "vertex index")?;
            if index == 0 || index > count {
                return Err(Error::invalid_input(format!(
                    "vertex index {index} outside 1..={count}"
                )));
            }
            let x: f64 = next_token(&mut tokens, "x coordinate")?;
            let y: f64 = next_token(&mut tokens, "y coordinate")?;
            if !x.is_finite() || !y.is_finite() {
                return Err(Error::invalid_input(format!(
                    "vertex {index} has non-finite coordinates"
                )));
            }
            let slot = &mut slots[index - 1];
            if slot.is_some() {
                return Err(Error::invalid_input(format!(
                    "vertex {index} listed more than once"
                )));
            }
            *slot = Some(Point::new(x, y));
        }

        let budget: i64 = next_token(&mut tokens, "time budget")?;
        if budget <= 0 {
            return Err(Error::invalid_input(format!(
                "time budget must be positive, got {budget}"
            )));
        }

        // Every index was distinct and in range, so all slots are filled.
        let points = slots.into_iter().flatten().collect();
        Ok(Self {
            points,
            time_budget_secs: budget as u64,
        })
    }
}

fn next_token<T: FromStr>(tokens: &mut SplitWhitespace<'_>, what: &str) -> Result<T> {
    let raw = tokens
        .next()
        .ok_or_else(|| Error::invalid_input(format!("missing {what}")))?;
    parse_token(raw, what)
}

fn parse_token<T: FromStr>(raw: &str, what: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::invalid_input(format!("cannot parse {what} from {raw:?}")))
}

/// Immutable coordinate table with an attached metric.
///
/// Vertices are identified by `1..=vertex_count()`.
#[derive(Debug, Clone)]
pub struct VertexDataset {
    points: Vec<Point>,
    time_budget_secs: u64,
    distance: DistanceFn,
}

impl VertexDataset {
    pub fn new(input: ProblemInput, distance: DistanceFn) -> Result<Self> {
        let ProblemInput {
            points,
            time_budget_secs,
        } = input;
        if points.is_empty() {
            return Err(Error::invalid_input("vertex count must be positive"));
        }
        if time_budget_secs == 0 {
            return Err(Error::invalid_input("time budget must be positive"));
        }
        Ok(Self {
            points,
            time_budget_secs,
            distance,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn time_budget_secs(&self) -> u64 {
        self.time_budget_secs
    }

    /// Coordinates of a 1-based vertex.
    ///
    /// # Panics
    ///
    /// Panics if `vertex` is not in `1..=vertex_count()`.
    pub fn point(&self, vertex: usize) -> Point {
        self.points[vertex - 1]
    }

    /// Distance between two 1-based vertices.
    ///
    /// # Panics
    ///
    /// Panics if either vertex is not in `1..=vertex_count()`.
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        (self.distance)(self.point(a), self.point(b))
    }
}
