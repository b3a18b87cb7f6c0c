//! # Grid scan and point builder
//!
//! [`extract_variable`] is the heart of the crate: it walks a value
//! variable's full index space in row-major order and, per cell, resolves a
//! timestamp, reads and validates the coordinates and the value, applies the
//! caller's spatial filters, and merges accepted samples into a
//! deduplicated point map. [`extract_variable_parallel`] runs the same
//! pipeline sharded over the flattened index space with a deterministic
//! in-order merge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hifitime::Epoch;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::constants::{Degree, GridCounter, Meter, PointMap};
use crate::dataset::{DataVariable, Dataset, NdArray};
use crate::envgrid_errors::EnvgridError;
use crate::gradient::{GradCell, GradientEstimator};
use crate::index_map::{cell_count, counter_from_flat, GridIndices, IndexProjection};
use crate::points::{point_id, DataPoint, Sample, VarInfo, VarType};
use crate::resolve::{find_value_variable, resolve_coordinates};
use crate::time::{epoch_zero, global_attr_time, TimeCodec};
use crate::validity::{meters_from_unit, ValueConv};

/// Number of flattened cells per parallel shard.
const PAR_CHUNK_LEN: usize = 8_192;

/// Caller-supplied acceptance filters and scan options.
///
/// Range bounds are inclusive; an infinite bound is ignored.
#[derive(Debug, Clone, Default)]
pub struct ExtractFilter {
    /// Coordinate timestamps earlier than this degrade to the file-level
    /// fallback date instead of being used as-is.
    pub date_limit: Option<Epoch>,
    pub lat_range: Option<(Degree, Degree)>,
    pub lon_range: Option<(Degree, Degree)>,
    /// Applied only to cells whose depth is finite.
    pub depth_range: Option<(Meter, Meter)>,
    /// Compute horizontal gradients (gridded variables only).
    pub compute_gradient: bool,
    /// Checked once per cell; when raised the extraction aborts with
    /// [`EnvgridError::Cancelled`] and no partial result.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Result of one variable extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Identity-keyed deduplicated points.
    pub points: PointMap,
    /// Metadata and observed envelopes of the scanned variable.
    pub info: VarInfo,
    /// Earliest timestamp resolved across *all* cells touched, accepted or
    /// not.
    pub from_date: Option<Epoch>,
    /// Latest such timestamp.
    pub to_date: Option<Epoch>,
    pub cells_total: usize,
    pub cells_accepted: usize,
}

/// Fold longitude or latitude into [-180, 180].
pub fn normalize_deg180(v: Degree) -> Degree {
    let mut v = v % 360.0;
    if v > 180.0 {
        v -= 360.0;
    } else if v < -180.0 {
        v += 360.0;
    }
    v
}

fn in_range(v: f64, range: Option<(f64, f64)>) -> bool {
    match range {
        None => true,
        Some((lo, hi)) => (!lo.is_finite() || v >= lo) && (!hi.is_finite() || v <= hi),
    }
}

/// A coordinate array with its conversion parameters and counter projection.
struct CoordCtx {
    array: NdArray,
    conv: ValueConv,
    proj: IndexProjection,
}

impl CoordCtx {
    fn build<V: DataVariable>(
        var: &V,
        value_dims: &[String],
        value_shape: &[usize],
    ) -> Result<Self, EnvgridError> {
        Ok(CoordCtx {
            array: var.read()?,
            conv: ValueConv::for_variable(var),
            proj: IndexProjection::build(
                value_dims,
                value_shape,
                &var.dimension_names(),
                &var.shape(),
            ),
        })
    }

    fn raw(&self, counter: &[usize]) -> Option<f64> {
        self.array.at(&self.proj.project(counter))
    }
}

struct TimeCtx {
    array: NdArray,
    codec: TimeCodec,
    proj: IndexProjection,
}

/// Everything the per-cell pipeline needs, fully materialized up front so
/// the scan itself never touches the dataset again.
struct ScanCtx {
    shape: Vec<usize>,
    value_array: NdArray,
    value_conv: ValueConv,
    log_scaled: bool,
    var_type: VarType,
    lat: CoordCtx,
    lon: CoordCtx,
    depth: Option<CoordCtx>,
    depth_factor: f64,
    time: Option<TimeCtx>,
    /// Timestamp of last resort: the file's global time attributes, else the
    /// Unix epoch.
    fallback_date: Epoch,
}

fn prepare<D: Dataset>(
    ds: &D,
    name: &str,
    date_limit: Option<Epoch>,
) -> Result<(ScanCtx, VarInfo), EnvgridError> {
    let value_var = find_value_variable(ds, name).ok_or_else(|| {
        EnvgridError::VariableNotFound(name.to_string(), ds.location().to_string())
    })?;
    let coords = resolve_coordinates(ds, value_var, name)?;

    let info = VarInfo::from_variable(value_var, ds.location());
    let value_dims = value_var.dimension_names();
    let value_shape = value_var.shape();

    let lat = CoordCtx::build(coords.lat, &value_dims, &value_shape)?;
    let lon = CoordCtx::build(coords.lon, &value_dims, &value_shape)?;

    let (depth, depth_factor) = match coords.depth {
        Some(var) => {
            let factor = meters_from_unit(&var.units().unwrap_or_default());
            (
                Some(CoordCtx::build(var, &value_dims, &value_shape)?),
                factor,
            )
        }
        None => (None, 1.0),
    };

    let time = match coords.time {
        Some(var) => match TimeCodec::for_variable(var, ds.location()) {
            Ok(codec) => {
                let proj = IndexProjection::build(
                    &value_dims,
                    &value_shape,
                    &var.dimension_names(),
                    &var.shape(),
                );
                if proj.is_empty() {
                    // No axis of the scanned variable maps onto the time
                    // coordinate; only the global fallback is usable.
                    debug!(
                        "{}: time axis '{}' does not map onto '{}'",
                        ds.location(),
                        var.name(),
                        name
                    );
                    None
                } else {
                    Some(TimeCtx {
                        array: var.read()?,
                        codec,
                        proj,
                    })
                }
            }
            Err(e) => {
                // A broken time axis degrades to the global fallback.
                warn!("{}: {e}", ds.location());
                None
            }
        },
        None => None,
    };

    // The caller's date limit also guards the attribute-sourced fallback; a
    // too-early attribute date degrades to epoch 0.
    let fallback_date = global_attr_time(ds)
        .filter(|t| date_limit.map_or(true, |limit| *t >= limit))
        .unwrap_or_else(epoch_zero);

    let ctx = ScanCtx {
        shape: value_shape,
        value_array: value_var.read()?,
        value_conv: ValueConv::for_variable(value_var),
        log_scaled: info.log_scaled,
        var_type: info.var_type,
        lat,
        lon,
        depth,
        depth_factor,
        time,
        fallback_date,
    };
    Ok((ctx, info))
}

/// Per-shard (or whole-scan) mutable accumulators.
#[derive(Default)]
struct Acc {
    points: PointMap,
    from_date: Option<Epoch>,
    to_date: Option<Epoch>,
    accepted: usize,
}

impl Acc {
    fn note_envelope(&mut self, t: Epoch) {
        match self.from_date {
            Some(d) if d <= t => {}
            _ => self.from_date = Some(t),
        }
        match self.to_date {
            Some(d) if d >= t => {}
            _ => self.to_date = Some(t),
        }
    }
}

impl ScanCtx {
    /// Resolve this cell's timestamp. Coordinate times earlier than the
    /// caller's date limit degrade to the file-level fallback.
    fn cell_time(&self, counter: &[usize], date_limit: Option<Epoch>) -> Epoch {
        let coord_time = self.time.as_ref().and_then(|t| {
            let raw = t.array.at(&t.proj.project(counter))?;
            raw.is_finite().then(|| t.codec.decode(raw))
        });
        match coord_time {
            Some(t) if date_limit.map_or(true, |limit| t >= limit) => t,
            _ => self.fallback_date,
        }
    }

    /// Run the full pipeline for one cell.
    ///
    /// Return
    /// ------
    /// * `Some(GradCell)` when the cell was accepted and merged, `None` on
    ///   rejection
    fn process_cell(
        &self,
        counter: &GridCounter,
        filter: &ExtractFilter,
        acc: &mut Acc,
        info: &mut VarInfo,
    ) -> Option<GradCell> {
        let time = self.cell_time(counter, filter.date_limit);
        acc.note_envelope(time);

        let lat_raw = self.lat.raw(counter)?;
        let lon_raw = self.lon.raw(counter)?;
        if !self.lat.conv.is_raw_valid(lat_raw) || !self.lon.conv.is_raw_valid(lon_raw) {
            return None;
        }
        let lat = normalize_deg180(self.lat.conv.apply(lat_raw));
        let lon = normalize_deg180(self.lon.conv.apply(lon_raw));

        let depth = match &self.depth {
            Some(d) => match d.raw(counter) {
                Some(raw) if d.conv.is_raw_valid(raw) => d.conv.apply(raw) * self.depth_factor,
                _ => f64::NAN,
            },
            None => f64::NAN,
        };

        if !in_range(lat, filter.lat_range) || !in_range(lon, filter.lon_range) {
            return None;
        }
        if depth.is_finite() && !in_range(depth, filter.depth_range) {
            return None;
        }

        let raw = self.value_array.at(counter)?;
        if !self.value_conv.is_raw_valid(raw) {
            return None;
        }
        let mut value = self.value_conv.apply(raw);
        if self.log_scaled {
            value = 10f64.powf(value);
        }

        let id = point_id(lat, lon);
        let sample = Sample { time, depth, value };
        let entry = acc.points.entry(id.clone()).or_insert_with(|| {
            let mut p = DataPoint::new(lat, lon);
            p.time = time;
            p.depth = depth;
            p.value = value;
            p.indexes_xy = Some(match self.var_type {
                VarType::GeoTrajectory => counter.clone(),
                _ => counter[counter.len().saturating_sub(2)..]
                    .iter()
                    .copied()
                    .collect(),
            });
            p
        });
        entry.push_history(sample);

        info.note_value(value);
        info.note_date(time);
        info.note_depth(depth);
        acc.accepted += 1;

        Some(GradCell {
            id,
            value,
            lat,
            lon,
        })
    }
}

fn check_cancel(cancel: &Option<Arc<AtomicBool>>) -> Result<(), EnvgridError> {
    match cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => Err(EnvgridError::Cancelled),
        _ => Ok(()),
    }
}

/// Extract a variable with a strictly sequential scan.
///
/// Arguments
/// ---------
/// * `ds`: the dataset to read from
/// * `name`: variable name or CF standard name
/// * `filter`: acceptance filters and scan options
///
/// Return
/// ------
/// * `Ok(Extraction)` with the deduplicated point map and variable summary
/// * `Err(EnvgridError)` when the variable is missing, not georeferenced,
///   unreadable, or the scan was cancelled
pub fn extract_variable<D: Dataset>(
    ds: &D,
    name: &str,
    filter: &ExtractFilter,
) -> Result<Extraction, EnvgridError> {
    let (ctx, mut info) = prepare(ds, name, filter.date_limit)?;
    debug!(
        "{}: scanning '{}' shape {:?}",
        info.file_name, info.name, ctx.shape
    );

    let gradient_on = filter.compute_gradient && info.var_type == VarType::Geo2d;
    let row_len = ctx.shape.last().copied().unwrap_or(0);
    let mut estimator = GradientEstimator::new(gradient_on, row_len);

    let mut acc = Acc::default();
    for counter in GridIndices::new(&ctx.shape) {
        check_cancel(&filter.cancel)?;
        let cell = ctx.process_cell(&counter, filter, &mut acc, &mut info);
        if let Some(assign) = estimator.observe(&counter, cell) {
            if let Some(p) = acc.points.get_mut(&assign.id) {
                if p.gradient.is_nan() {
                    p.gradient = assign.magnitude;
                }
            }
        }
    }
    estimator.publish(&mut info);

    let cells_total = cell_count(&ctx.shape);
    info!(
        "{}: '{}' scan accepted {} of {} cells into {} points",
        info.file_name,
        info.name,
        acc.accepted,
        cells_total,
        acc.points.len()
    );

    Ok(Extraction {
        points: acc.points,
        info,
        from_date: acc.from_date,
        to_date: acc.to_date,
        cells_total,
        cells_accepted: acc.accepted,
    })
}

/// Extract a variable with the scan sharded over the flattened index space.
///
/// Shards are merged back in counter order, so the result map, histories and
/// envelopes are identical to the sequential scan's. Gradient computation
/// depends on counter-order visitation and is disabled here regardless of
/// [`ExtractFilter::compute_gradient`].
pub fn extract_variable_parallel<D: Dataset + Sync>(
    ds: &D,
    name: &str,
    filter: &ExtractFilter,
) -> Result<Extraction, EnvgridError> {
    let (ctx, mut info) = prepare(ds, name, filter.date_limit)?;
    if filter.compute_gradient {
        debug!(
            "{}: gradient computation disabled under parallel scan",
            info.file_name
        );
    }

    let cells_total = cell_count(&ctx.shape);
    let n_chunks = cells_total.div_ceil(PAR_CHUNK_LEN);

    let shards: Vec<(Acc, VarInfo)> = (0..n_chunks)
        .into_par_iter()
        .map(|chunk| {
            let mut acc = Acc::default();
            let mut shard_info = info.clone();
            let start = chunk * PAR_CHUNK_LEN;
            let end = (start + PAR_CHUNK_LEN).min(cells_total);
            for flat in start..end {
                check_cancel(&filter.cancel)?;
                let counter = counter_from_flat(&ctx.shape, flat);
                ctx.process_cell(&counter, filter, &mut acc, &mut shard_info);
            }
            Ok((acc, shard_info))
        })
        .collect::<Result<_, EnvgridError>>()?;

    let mut acc = Acc::default();
    for (shard, shard_info) in shards {
        for (id, point) in shard.points {
            match acc.points.get_mut(&id) {
                // Earlier shards hold earlier cells: the canonical entry and
                // its indexes stay, later samples go through history dedup.
                Some(canonical) => {
                    for sample in point.history() {
                        canonical.push_history(*sample);
                    }
                }
                None => {
                    acc.points.insert(id, point);
                }
            }
        }
        if let Some(t) = shard.from_date {
            acc.note_envelope(t);
        }
        if let Some(t) = shard.to_date {
            acc.note_envelope(t);
        }
        acc.accepted += shard.accepted;
        info.merge(&shard_info);
    }

    info!(
        "{}: '{}' parallel scan accepted {} of {} cells into {} points",
        info.file_name,
        info.name,
        acc.accepted,
        cells_total,
        acc.points.len()
    );

    Ok(Extraction {
        points: acc.points,
        info,
        from_date: acc.from_date,
        to_date: acc.to_date,
        cells_total,
        cells_accepted: acc.accepted,
    })
}

#[cfg(test)]
mod scan_test {
    use super::*;

    #[test]
    fn test_normalize_deg180() {
        assert_eq!(normalize_deg180(190.0), -170.0);
        assert_eq!(normalize_deg180(-190.0), 170.0);
        assert_eq!(normalize_deg180(180.0), 180.0);
        assert_eq!(normalize_deg180(-180.0), -180.0);
        assert_eq!(normalize_deg180(540.0), 180.0);
        assert_eq!(normalize_deg180(41.5), 41.5);
    }

    #[test]
    fn test_in_range() {
        assert!(in_range(5.0, None));
        assert!(in_range(5.0, Some((0.0, 10.0))));
        assert!(in_range(0.0, Some((0.0, 10.0))));
        assert!(!in_range(-0.1, Some((0.0, 10.0))));
        assert!(in_range(1e9, Some((0.0, f64::INFINITY))));
    }
}
