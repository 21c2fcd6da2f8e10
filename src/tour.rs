//! Cyclic tour with an incrementally maintained length.
//!
//! Each slot caches the length of its forward edge (the edge to the next
//! slot, wrapping at the end). A swap touches at most four forward edges,
//! so the total is adjusted by their net delta instead of being resummed.

use std::cell::Cell;

use crate::dataset::VertexDataset;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    vertex: usize,
    next_distance: f64,
}

/// A closed path visiting every vertex of a dataset exactly once.
///
/// The total length is cached behind a dirty flag. Construction marks the
/// cache dirty so the first [`length`](Tour::length) call sums the slots;
/// later swaps keep the clean cache up to date in O(1).
#[derive(Debug)]
pub struct Tour {
    slots: Vec<Slot>,
    total: Cell<f64>,
    dirty: Cell<bool>,
}

impl Clone for Tour {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            total: self.total.clone(),
            dirty: self.dirty.clone(),
        }
    }

    // Reuses the slot buffer; the engine commits by copying every accepted move.
    fn clone_from(&mut self, source: &Self) {
        self.slots.clone_from(&source.slots);
        self.total.set(source.total.get());
        self.dirty.set(source.dirty.get());
    }
}

impl Tour {
    /// The tour `1, 2, …, n` in increasing vertex order.
    pub fn canonical(dataset: &VertexDataset) -> Self {
        let n = dataset.vertex_count();
        let slots = (1..=n)
            .map(|vertex| {
                let next = vertex % n + 1;
                Slot {
                    vertex,
                    next_distance: dataset.distance(vertex, next),
                }
            })
            .collect();
        Self {
            slots,
            total: Cell::new(0.0),
            dirty: Cell::new(true),
        }
    }

    /// Number of vertices in the tour.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total length of the closed path.
    pub fn length(&self) -> f64 {
        if self.dirty.get() {
            let sum = self.slots.iter().map(|s| s.next_distance).sum();
            self.total.set(sum);
            self.dirty.set(false);
        }
        self.total.get()
    }

    /// Length recomputed from the dataset, ignoring every cached value.
    pub fn recompute_length(&self, dataset: &VertexDataset) -> f64 {
        let n = self.slots.len();
        (0..n)
            .map(|i| dataset.distance(self.slots[i].vertex, self.slots[(i + 1) % n].vertex))
            .sum()
    }

    /// Vertex stored at `position`.
    pub fn vertex_at(&self, position: usize) -> Result<usize> {
        self.slots
            .get(position)
            .map(|s| s.vertex)
            .ok_or(Error::IndexOutOfRange {
                index: position,
                len: self.slots.len(),
            })
    }

    /// Vertices in tour order, starting at position 0.
    pub fn vertices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().map(|s| s.vertex)
    }

    /// Vertex order rotated so that it begins at `vertex`.
    ///
    /// ```
    /// use tsp_anneal::dataset::{euclidean, Point, ProblemInput, VertexDataset};
    /// use tsp_anneal::tour::Tour;
    ///
    /// let points = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
    /// let dataset = VertexDataset::new(ProblemInput::new(points, 1).unwrap(), euclidean).unwrap();
    /// let tour = Tour::canonical(&dataset);
    /// assert_eq!(tour.starting_from(2).unwrap(), vec![2, 3, 1]);
    /// ```
    pub fn starting_from(&self, vertex: usize) -> Result<Vec<usize>> {
        let start = self
            .slots
            .iter()
            .position(|s| s.vertex == vertex)
            .ok_or_else(|| Error::invalid_argument(format!("vertex {vertex} is not in the tour")))?;
        Ok(self.slots[start..]
            .iter()
            .chain(&self.slots[..start])
            .map(|s| s.vertex)
            .collect())
    }

    /// Exchanges the vertices at positions `a` and `b`.
    ///
    /// Only the forward edges of `prev(a)`, `a`, `prev(b)` and `b` can change.
    /// When the positions are adjacent two of those slots coincide; each
    /// distinct slot is recomputed and counted exactly once.
    pub fn swap(&mut self, dataset: &VertexDataset, a: usize, b: usize) -> Result<()> {
        let n = self.slots.len();
        for index in [a, b] {
            if index >= n {
                return Err(Error::IndexOutOfRange { index, len: n });
            }
        }
        if a == b {
            return Ok(());
        }

        self.slots.swap(a, b);

        let prev = |i: usize| if i == 0 { n - 1 } else { i - 1 };
        let touched = [prev(a), a, prev(b), b];
        let mut delta = 0.0;
        for (k, &slot) in touched.iter().enumerate() {
            if touched[..k].contains(&slot) {
                continue;
            }
            let next = (slot + 1) % n;
            let distance = dataset.distance(self.slots[slot].vertex, self.slots[next].vertex);
            delta += distance - self.slots[slot].next_distance;
            self.slots[slot].next_distance = distance;
        }

        if !self.dirty.get() {
            self.total.set(self.total.get() + delta);
        }
        Ok(())
    }
}
