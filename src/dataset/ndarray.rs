//! Row-major N-dimensional array of `f64` samples.
//!
//! This is the bulk-read payload handed over by a [`DataVariable`]: a flat
//! buffer plus a shape, indexed with last-axis-fastest (row-major) strides.
//! Coordinate variables are read through a *projected* index tuple that may
//! have fewer dimensions than the array itself; missing trailing indices are
//! treated as zero so that a degenerate (empty) projection reads the origin.
//!
//! [`DataVariable`]: super::DataVariable

/// A dense row-major array with an explicit shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    data: Vec<f64>,
    shape: Vec<usize>,
}

impl NdArray {
    /// Build an array from a flat buffer and a shape.
    ///
    /// Arguments
    /// ---------
    /// * `data`: row-major samples, `shape.iter().product()` elements
    /// * `shape`: per-axis lengths, outermost first
    ///
    /// Return
    /// ------
    /// * `Some(NdArray)` if the buffer length matches the shape, else `None`
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Option<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return None;
        }
        Some(NdArray { data, shape })
    }

    /// A rank-0 array holding a single value.
    pub fn scalar(value: f64) -> Self {
        NdArray {
            data: vec![value],
            shape: Vec::new(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major flat offset for an index tuple.
    ///
    /// The tuple may be *shorter* than the rank: missing trailing axes are
    /// read at position 0. A tuple longer than the rank, or any index out of
    /// bounds, yields `None`.
    fn linear_index(&self, idx: &[usize]) -> Option<usize> {
        if idx.len() > self.shape.len() {
            return None;
        }
        let mut flat = 0usize;
        let mut stride = 1usize;
        for (axis, &dim) in self.shape.iter().enumerate().rev() {
            let i = idx.get(axis).copied().unwrap_or(0);
            if i >= dim {
                return None;
            }
            flat += i * stride;
            stride *= dim;
        }
        Some(flat)
    }

    /// Read the value at an index tuple (see [`Self::linear_index`] for the
    /// short-tuple semantics).
    pub fn at(&self, idx: &[usize]) -> Option<f64> {
        let flat = self.linear_index(idx)?;
        self.data.get(flat).copied()
    }
}
