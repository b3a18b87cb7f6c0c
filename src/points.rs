//! # Extracted points and variable metadata
//!
//! The extraction output is a map of [`DataPoint`]s keyed by a rounded
//! lat/lon identity, each carrying a deduplicated history of
//! [`Sample`]s, plus one [`VarInfo`] summarizing the scanned variable
//! (display names, units, observed value/date/depth envelopes, gradient
//! envelope).

use hifitime::Epoch;

use crate::constants::{ATT_COMMENT, ATT_LONG_NAME, ATT_STANDARD_NAME, Degree, GridCounter, Meter};
use crate::dataset::DataVariable;
use crate::validity::strip_log_unit;

/// Shape class of a scanned variable, from its number of dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    /// One-dimensional: a sequence of georeferenced samples.
    GeoTrajectory,
    /// Two or more dimensions: a gridded field.
    Geo2d,
    Unknown,
}

impl VarType {
    pub fn from_rank(rank: usize) -> Self {
        match rank {
            0 => VarType::Unknown,
            1 => VarType::GeoTrajectory,
            _ => VarType::Geo2d,
        }
    }
}

/// One accepted measurement at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: Epoch,
    /// Meters, positive down; NaN when the grid has no depth axis.
    pub depth: Meter,
    pub value: f64,
}

/// Depth equality for history dedup. NaN depths (no depth axis) compare
/// equal so that depthless repeats still deduplicate.
fn depth_eq(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

/// A geolocated point with its canonical sample and full sample history.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub lat: Degree,
    pub lon: Degree,
    /// Canonical sample fields: the first accepted sample at this identity.
    pub depth: Meter,
    pub value: f64,
    pub time: Epoch,
    /// Horizontal gradient magnitude, NaN until assigned.
    pub gradient: f64,
    /// Grid position of the first accepted sample. Assigned once.
    pub indexes_xy: Option<GridCounter>,
    history: Vec<Sample>,
}

impl DataPoint {
    pub fn new(lat: Degree, lon: Degree) -> Self {
        DataPoint {
            lat,
            lon,
            depth: f64::NAN,
            value: f64::NAN,
            time: crate::time::epoch_zero(),
            gradient: f64::NAN,
            indexes_xy: None,
            history: Vec::new(),
        }
    }

    /// Rounded-coordinate identity key of this point.
    pub fn id(&self) -> String {
        point_id(self.lat, self.lon)
    }

    /// Append a sample unless an equal `(time, depth)` pair is already
    /// recorded. The sample's value takes no part in the comparison, so a
    /// repeat at the same instant and depth keeps the first value seen.
    ///
    /// Return
    /// ------
    /// * `true` if the sample was recorded
    pub fn push_history(&mut self, sample: Sample) -> bool {
        let dup = self
            .history
            .iter()
            .any(|s| s.time == sample.time && depth_eq(s.depth, sample.depth));
        if dup {
            return false;
        }
        self.history.push(sample);
        true
    }

    pub fn history(&self) -> &[Sample] {
        &self.history
    }
}

/// Identity key of a coordinate pair: both angles rounded to
/// [`ID_DECIMAL_DIGITS`] decimal places, colon-separated.
///
/// [`ID_DECIMAL_DIGITS`]: crate::constants::ID_DECIMAL_DIGITS
pub fn point_id(lat: Degree, lon: Degree) -> String {
    let prec = crate::constants::ID_DECIMAL_DIGITS;
    format!("{lat:.prec$}:{lon:.prec$}")
}

/// Metadata and observed envelopes for one scanned variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub name: String,
    /// Display name: `long_name` when present, else the variable name.
    pub full_name: String,
    pub standard_name: Option<String>,
    /// Physical unit, with any `log(...)` wrapper already stripped.
    pub unit: String,
    /// Values were stored as base-10 logarithms and have been unlogged.
    pub log_scaled: bool,
    pub comment: Option<String>,
    pub var_type: VarType,
    pub file_name: String,
    /// Last-two-axes shape of a gridded variable, `None` otherwise.
    pub size_xy: Option<(usize, usize)>,
    pub min_val: f64,
    pub max_val: f64,
    pub min_date: Option<Epoch>,
    pub max_date: Option<Epoch>,
    pub min_depth: f64,
    pub max_depth: f64,
    pub valid_gradient: bool,
    pub min_gradient: f64,
    pub max_gradient: f64,
}

impl VarInfo {
    /// Seed the metadata from a variable's attributes; envelopes start at
    /// their sentinels and are tightened by the `note_*` accumulators.
    pub fn from_variable<V: DataVariable>(var: &V, file_name: &str) -> Self {
        let name = var.name().to_string();
        let full_name = var
            .attribute(ATT_LONG_NAME)
            .and_then(|a| a.as_str().map(str::to_owned))
            .unwrap_or_else(|| name.clone());
        let standard_name = var
            .attribute(ATT_STANDARD_NAME)
            .and_then(|a| a.as_str().map(str::to_owned));
        let (unit, log_scaled) = strip_log_unit(&var.units().unwrap_or_default());
        let comment = var
            .attribute(ATT_COMMENT)
            .and_then(|a| a.as_str().map(str::to_owned));

        let shape = var.shape();
        let var_type = VarType::from_rank(shape.len());
        let size_xy = match var_type {
            VarType::Geo2d => Some((shape[shape.len() - 2], shape[shape.len() - 1])),
            _ => None,
        };

        VarInfo {
            name,
            full_name,
            standard_name,
            unit,
            log_scaled,
            comment,
            var_type,
            file_name: file_name.to_string(),
            size_xy,
            min_val: f64::INFINITY,
            max_val: f64::NEG_INFINITY,
            min_date: None,
            max_date: None,
            min_depth: f64::INFINITY,
            max_depth: f64::NEG_INFINITY,
            valid_gradient: false,
            min_gradient: f64::INFINITY,
            max_gradient: f64::NEG_INFINITY,
        }
    }

    pub fn note_value(&mut self, v: f64) {
        if v.is_finite() {
            self.min_val = self.min_val.min(v);
            self.max_val = self.max_val.max(v);
        }
    }

    pub fn note_date(&mut self, t: Epoch) {
        match self.min_date {
            Some(d) if d <= t => {}
            _ => self.min_date = Some(t),
        }
        match self.max_date {
            Some(d) if d >= t => {}
            _ => self.max_date = Some(t),
        }
    }

    pub fn note_depth(&mut self, d: Meter) {
        if d.is_finite() {
            self.min_depth = self.min_depth.min(d);
            self.max_depth = self.max_depth.max(d);
        }
    }

    /// Fold another accumulator of the same variable into this one (used by
    /// the sharded parallel scan).
    pub fn merge(&mut self, other: &VarInfo) {
        self.min_val = self.min_val.min(other.min_val);
        self.max_val = self.max_val.max(other.max_val);
        if let Some(d) = other.min_date {
            self.note_date(d);
        }
        if let Some(d) = other.max_date {
            self.note_date(d);
        }
        self.min_depth = self.min_depth.min(other.min_depth);
        self.max_depth = self.max_depth.max(other.max_depth);
        if other.valid_gradient {
            self.valid_gradient = true;
            self.min_gradient = self.min_gradient.min(other.min_gradient);
            self.max_gradient = self.max_gradient.max(other.max_gradient);
        }
    }
}

#[cfg(test)]
mod points_test {
    use super::*;
    use crate::time::epoch_from_millis;

    #[test]
    fn test_point_id_rounding() {
        assert_eq!(point_id(41.5, -8.25), "41.50000000:-8.25000000");
        // Differences below the 8th decimal collapse to one identity.
        assert_eq!(point_id(41.5000000001, -8.25), point_id(41.5, -8.25));
    }

    #[test]
    fn test_history_dedup_ignores_value() {
        let mut p = DataPoint::new(41.0, -8.0);
        let t = epoch_from_millis(1_000.0);
        assert!(p.push_history(Sample {
            time: t,
            depth: 5.0,
            value: 17.0
        }));
        assert!(!p.push_history(Sample {
            time: t,
            depth: 5.0,
            value: 99.0
        }));
        assert_eq!(p.history().len(), 1);
        assert_eq!(p.history()[0].value, 17.0);
    }

    #[test]
    fn test_history_distinct_depth_kept() {
        let mut p = DataPoint::new(41.0, -8.0);
        let t = epoch_from_millis(1_000.0);
        assert!(p.push_history(Sample {
            time: t,
            depth: 5.0,
            value: 1.0
        }));
        assert!(p.push_history(Sample {
            time: t,
            depth: 10.0,
            value: 1.0
        }));
        assert_eq!(p.history().len(), 2);
    }

    #[test]
    fn test_history_nan_depth_dedups() {
        let mut p = DataPoint::new(41.0, -8.0);
        let t = epoch_from_millis(1_000.0);
        assert!(p.push_history(Sample {
            time: t,
            depth: f64::NAN,
            value: 1.0
        }));
        assert!(!p.push_history(Sample {
            time: t,
            depth: f64::NAN,
            value: 2.0
        }));
    }

    #[test]
    fn test_var_type_from_rank() {
        assert_eq!(VarType::from_rank(1), VarType::GeoTrajectory);
        assert_eq!(VarType::from_rank(2), VarType::Geo2d);
        assert_eq!(VarType::from_rank(4), VarType::Geo2d);
        assert_eq!(VarType::from_rank(0), VarType::Unknown);
    }

    #[test]
    fn test_info_from_variable() {
        use crate::dataset::memory::MemVariable;
        use crate::dataset::NdArray;

        let var = MemVariable::new(
            "chl",
            &["lat", "lon"],
            NdArray::new(vec![0.0; 6], vec![2, 3]).unwrap(),
        )
        .with_text_attr("long_name", "chlorophyll")
        .with_text_attr("units", "log(mg.m-3)");
        let info = VarInfo::from_variable(&var, "f.nc");
        assert_eq!(info.full_name, "chlorophyll");
        assert_eq!(info.unit, "mg.m-3");
        assert!(info.log_scaled);
        assert_eq!(info.var_type, VarType::Geo2d);
        assert_eq!(info.size_xy, Some((2, 3)));
        assert!(!info.valid_gradient);
    }

    #[test]
    fn test_envelope_accumulators() {
        use crate::dataset::memory::MemVariable;
        use crate::dataset::NdArray;

        let mut info = VarInfo::from_variable(
            &MemVariable::new("v", &["x"], NdArray::new(vec![0.0], vec![1]).unwrap()),
            "f",
        );
        info.note_value(5.0);
        info.note_value(-2.0);
        info.note_value(f64::NAN);
        assert_eq!((info.min_val, info.max_val), (-2.0, 5.0));

        let early = epoch_from_millis(0.0);
        let late = epoch_from_millis(9_000.0);
        info.note_date(late);
        info.note_date(early);
        assert_eq!(info.min_date, Some(early));
        assert_eq!(info.max_date, Some(late));
    }
}
