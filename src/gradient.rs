//! Horizontal gradient estimation over the scan's cell stream.
//!
//! A 1-D buffer sized to the grid's fastest-varying axis holds the previous
//! row of accepted cells. As the scan advances, the cell about to be evicted
//! from the buffer gets compared against its X neighbor (the next slot, not
//! yet overwritten) and its Y neighbor (the current cell, one row below),
//! and the magnitude `sqrt(dx^2 + dy^2)` is assigned to that evicted cell.
//! Gradients are therefore assigned one step behind the scan. Rejected cells
//! still advance the buffer as "no point" so the stencil stays aligned with
//! grid position.

use crate::points::VarInfo;

/// The slice of an accepted point the stencil needs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradCell {
    pub id: String,
    pub value: f64,
    pub lat: f64,
    pub lon: f64,
}

/// A gradient magnitude to assign to an already-emitted point.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradAssign {
    pub id: String,
    pub magnitude: f64,
}

#[derive(Debug)]
pub(crate) struct GradientEstimator {
    enabled: bool,
    buffer: Vec<Option<GradCell>>,
    prev_outer: Option<usize>,
    min_gradient: f64,
    max_gradient: f64,
    // Informational min-delta trackers, absolute lon/lat steps between
    // X-adjacent accepted cells.
    min_delta_x: f64,
    min_delta_y: f64,
}

impl GradientEstimator {
    /// Arguments
    /// ---------
    /// * `enabled`: a disabled estimator accepts observations and does nothing
    /// * `row_len`: length of the grid's last (fastest) axis
    pub fn new(enabled: bool, row_len: usize) -> Self {
        GradientEstimator {
            enabled,
            buffer: vec![None; row_len],
            prev_outer: None,
            min_gradient: f64::INFINITY,
            max_gradient: f64::NEG_INFINITY,
            min_delta_x: f64::INFINITY,
            min_delta_y: f64::INFINITY,
        }
    }

    /// Advance the stencil by one cell.
    ///
    /// Arguments
    /// ---------
    /// * `counter`: the scan's current grid position
    /// * `cell`: the accepted point at that position, `None` on rejection
    ///
    /// Return
    /// ------
    /// * `Some(GradAssign)` when a magnitude became known for a previously
    ///   emitted point
    pub fn observe(&mut self, counter: &[usize], cell: Option<GradCell>) -> Option<GradAssign> {
        if !self.enabled || self.buffer.is_empty() {
            return None;
        }

        // A change on the third-from-last axis means a new 2-D slice started
        // (leading time or ensemble axis); the previous row is unrelated.
        if counter.len() >= 3 {
            let outer = counter[counter.len() - 3];
            if self.prev_outer.is_some_and(|p| p != outer) {
                self.buffer.iter_mut().for_each(|slot| *slot = None);
            }
            self.prev_outer = Some(outer);
        }

        let slot = match counter.last() {
            Some(&x) if x < self.buffer.len() => x,
            _ => return None,
        };

        let up_x = self.buffer[slot].take();
        let mut assign = None;
        if let Some(up_x) = up_x {
            let up_x_next = self.buffer.get(slot + 1).and_then(|s| s.as_ref());

            let dx = up_x_next
                .filter(|n| n.value.is_finite())
                .map_or(0.0, |n| n.value - up_x.value);
            let dy = cell
                .as_ref()
                .filter(|c| c.value.is_finite())
                .map_or(0.0, |c| c.value - up_x.value);

            let has_neighbor = up_x_next.is_some_and(|n| n.value.is_finite())
                || cell.as_ref().is_some_and(|c| c.value.is_finite());
            if has_neighbor && up_x.value.is_finite() {
                let magnitude = (dx * dx + dy * dy).sqrt();
                self.min_gradient = self.min_gradient.min(magnitude);
                self.max_gradient = self.max_gradient.max(magnitude);
                assign = Some(GradAssign {
                    id: up_x.id.clone(),
                    magnitude,
                });
            }

            if let Some(next) = up_x_next {
                let dlon = (next.lon - up_x.lon).abs();
                let dlat = (next.lat - up_x.lat).abs();
                if dlon > 0.0 {
                    self.min_delta_x = self.min_delta_x.min(dlon);
                }
                if dlat > 0.0 {
                    self.min_delta_y = self.min_delta_y.min(dlat);
                }
            }
        }

        self.buffer[slot] = cell;
        assign
    }

    /// Publish the gradient envelope onto the variable summary, only when at
    /// least one finite magnitude was recorded.
    pub fn publish(&self, info: &mut VarInfo) {
        if self.min_gradient < f64::INFINITY || self.max_gradient > f64::NEG_INFINITY {
            info.valid_gradient = true;
            info.min_gradient = self.min_gradient;
            info.max_gradient = self.max_gradient;
        }
    }
}
