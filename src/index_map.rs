//! Grid traversal and coordinate index projection.
//!
//! The scan walks the value variable's full index space in row-major order
//! ([`GridIndices`]). Coordinate variables usually span a *subset* of the
//! value variable's dimensions (a 1-D `lat(lat)` axis against a 3-D
//! `sst(time, lat, lon)` grid); [`IndexProjection`] maps a value-space
//! counter to the coordinate's own index tuple.

use smallvec::SmallVec;

use crate::constants::GridCounter;

/// Mapping from a value-variable counter to a coordinate variable's indices.
///
/// Built per coordinate, once, before the scan. Each coordinate axis is
/// matched to a value axis by name first, then by length among the axes not
/// yet claimed. If any coordinate axis stays unmatched the projection is
/// *empty*: the coordinate is then read at its origin for every cell, which
/// is the right behavior for scalar and degenerate axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexProjection {
    /// For each coordinate axis, the value-counter position it reads.
    positions: SmallVec<[usize; 4]>,
}

impl IndexProjection {
    /// Arguments
    /// ---------
    /// * `value_dims` / `value_shape`: the scanned variable's axes
    /// * `coord_dims` / `coord_shape`: the coordinate variable's axes
    pub fn build(
        value_dims: &[String],
        value_shape: &[usize],
        coord_dims: &[String],
        coord_shape: &[usize],
    ) -> Self {
        let mut positions: SmallVec<[usize; 4]> = SmallVec::new();
        let mut used = vec![false; value_dims.len()];

        for (ci, cdim) in coord_dims.iter().enumerate() {
            let by_name = value_dims
                .iter()
                .position(|vdim| vdim.eq_ignore_ascii_case(cdim));
            let pos = by_name.or_else(|| {
                // Fall back to a length match among unclaimed value axes.
                let clen = coord_shape.get(ci).copied()?;
                value_shape
                    .iter()
                    .enumerate()
                    .position(|(vi, &vlen)| !used[vi] && vlen == clen)
            });
            match pos {
                Some(p) => {
                    used[p] = true;
                    positions.push(p);
                }
                None => {
                    return IndexProjection {
                        positions: SmallVec::new(),
                    }
                }
            }
        }

        IndexProjection { positions }
    }

    /// Projection that always reads the coordinate's origin.
    pub fn empty() -> Self {
        IndexProjection {
            positions: SmallVec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Project a value-space counter to the coordinate's index tuple.
    pub fn project(&self, counter: &[usize]) -> SmallVec<[usize; 4]> {
        self.positions
            .iter()
            .map(|&p| counter.get(p).copied().unwrap_or(0))
            .collect()
    }
}

/// Row-major iterator over all counters of a shape.
///
/// An empty shape or any zero-length axis yields no items.
#[derive(Debug, Clone)]
pub struct GridIndices {
    shape: Vec<usize>,
    counter: GridCounter,
    done: bool,
}

impl GridIndices {
    pub fn new(shape: &[usize]) -> Self {
        let done = shape.is_empty() || shape.contains(&0);
        GridIndices {
            shape: shape.to_vec(),
            counter: shape.iter().map(|_| 0).collect(),
            done,
        }
    }
}

impl Iterator for GridIndices {
    type Item = GridCounter;

    fn next(&mut self) -> Option<GridCounter> {
        if self.done {
            return None;
        }
        let current = self.counter.clone();
        // Odometer advance, last axis fastest.
        let mut axis = self.shape.len();
        loop {
            if axis == 0 {
                self.done = true;
                break;
            }
            axis -= 1;
            self.counter[axis] += 1;
            if self.counter[axis] < self.shape[axis] {
                break;
            }
            self.counter[axis] = 0;
        }
        Some(current)
    }
}

/// Counter of the `flat`-th cell of a row-major shape.
pub fn counter_from_flat(shape: &[usize], flat: usize) -> GridCounter {
    let mut counter: GridCounter = shape.iter().map(|_| 0).collect();
    let mut rem = flat;
    for axis in (0..shape.len()).rev() {
        let dim = shape[axis].max(1);
        counter[axis] = rem % dim;
        rem /= dim;
    }
    counter
}

/// Total number of cells of a shape (0 for an empty shape).
pub fn cell_count(shape: &[usize]) -> usize {
    if shape.is_empty() {
        0
    } else {
        shape.iter().product()
    }
}
