//! Raw-value validity and normalization.
//!
//! Packed grids carry a fill value, an optional valid range, and a linear
//! `scale_factor`/`add_offset` pair. [`ValueConv`] captures those per
//! variable, decides whether a raw sample is valid, and converts valid raw
//! samples to physical values. Validity is always checked on the **raw**
//! (pre-scaling) value.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{
    ATT_ADD_OFFSET, ATT_FILL_VALUE, ATT_MISSING_VALUE, ATT_SCALE_FACTOR, ATT_VALID_MAX,
    ATT_VALID_MIN, ATT_VALID_RANGE, FILL_EPS,
};
use crate::dataset::DataVariable;

/// Case-insensitive `log(unit)` / `lg(unit)` wrapper, capturing the inner unit.
static LOG_UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*lo?g\((.*)\)\s*$").unwrap());

/// Per-variable fill/range/scale parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueConv {
    /// Fill value on the raw scale; NaN when the variable declares none.
    fill: f64,
    /// Inclusive raw valid range.
    range: Option<(f64, f64)>,
    scale: f64,
    offset: f64,
}

impl ValueConv {
    /// Pass-through conversion: no fill, no range, identity scaling.
    pub fn identity() -> Self {
        ValueConv {
            fill: f64::NAN,
            range: None,
            scale: 1.0,
            offset: 0.0,
        }
    }

    /// Extract the conversion parameters from a variable's attributes.
    ///
    /// `_FillValue` wins over `missing_value`. `valid_range` wins over the
    /// single-sided `valid_min`/`valid_max` pair; a non-finite range bound
    /// disables the range check, a missing single side is open.
    pub fn for_variable<V: DataVariable>(var: &V) -> Self {
        let fill = var
            .attribute(ATT_FILL_VALUE)
            .and_then(|a| a.as_f64())
            .or_else(|| var.attribute(ATT_MISSING_VALUE).and_then(|a| a.as_f64()))
            .unwrap_or(f64::NAN);

        let range = match var.attribute(ATT_VALID_RANGE) {
            Some(a) => {
                let lo = a.f64_at(0);
                let hi = a.f64_at(1);
                match (lo, hi) {
                    (Some(lo), Some(hi)) if lo.is_finite() && hi.is_finite() => Some((lo, hi)),
                    _ => None,
                }
            }
            None => {
                let lo = var.attribute(ATT_VALID_MIN).and_then(|a| a.as_f64());
                let hi = var.attribute(ATT_VALID_MAX).and_then(|a| a.as_f64());
                match (lo, hi) {
                    (None, None) => None,
                    (lo, hi) => Some((
                        lo.unwrap_or(f64::NEG_INFINITY),
                        hi.unwrap_or(f64::INFINITY),
                    )),
                }
            }
        };

        let scale = var
            .attribute(ATT_SCALE_FACTOR)
            .and_then(|a| a.as_f64())
            .unwrap_or(1.0);
        let offset = var
            .attribute(ATT_ADD_OFFSET)
            .and_then(|a| a.as_f64())
            .unwrap_or(0.0);

        ValueConv {
            fill,
            range,
            scale,
            offset,
        }
    }

    /// Is this raw (pre-scaling) value usable?
    ///
    /// Rejects NaN, the fill value (relative tolerance `1e-9`), and values
    /// outside the declared valid range.
    pub fn is_raw_valid(&self, raw: f64) -> bool {
        if raw.is_nan() {
            return false;
        }
        if !self.fill.is_nan() {
            let tol = FILL_EPS * self.fill.abs().max(1.0);
            if (raw - self.fill).abs() <= tol {
                return false;
            }
        }
        if let Some((lo, hi)) = self.range {
            if raw < lo || raw > hi {
                return false;
            }
        }
        true
    }

    /// Convert a raw value to the physical scale.
    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.scale + self.offset
    }
}

/// Strip a `log(...)`/`lg(...)` wrapper from a units string.
///
/// Return
/// ------
/// * `(inner_or_original, was_logarithmic)`
pub fn strip_log_unit(unit: &str) -> (String, bool) {
    match LOG_UNIT_RE.captures(unit) {
        Some(caps) => (caps[1].trim().to_string(), true),
        None => (unit.to_string(), false),
    }
}

/// Factor converting one unit of `unit` to meters, for the length units the
/// depth axis is allowed to carry. Unknown units are taken as meters.
pub fn meters_from_unit(unit: &str) -> f64 {
    match unit.trim().to_ascii_lowercase().as_str() {
        "km" => 1_000.0,
        "dm" => 0.1,
        "cm" => 0.01,
        "mm" => 0.001,
        "ft" => 0.3048,
        _ => 1.0,
    }
}

#[cfg(test)]
mod validity_test {
    use super::*;
    use crate::dataset::memory::MemVariable;
    use crate::dataset::{AttrValue, NdArray};

    fn var_with(attrs: &[(&str, AttrValue)]) -> MemVariable {
        let mut v = MemVariable::new("v", &["x"], NdArray::new(vec![0.0], vec![1]).unwrap());
        for (name, value) in attrs {
            v = v.with_attr(*name, value.clone());
        }
        v
    }

    #[test]
    fn test_fill_value_rejected() {
        let conv = ValueConv::for_variable(&var_with(&[(
            ATT_FILL_VALUE,
            AttrValue::Number(-9999.0),
        )]));
        assert!(!conv.is_raw_valid(-9999.0));
        assert!(!conv.is_raw_valid(-9999.000001));
        assert!(conv.is_raw_valid(-9998.0));
        assert!(conv.is_raw_valid(0.0));
    }

    #[test]
    fn test_missing_value_fallback() {
        let conv =
            ValueConv::for_variable(&var_with(&[(ATT_MISSING_VALUE, AttrValue::Number(1e20))]));
        assert!(!conv.is_raw_valid(1e20));
        assert!(conv.is_raw_valid(25.0));
    }

    #[test]
    fn test_valid_range() {
        let conv = ValueConv::for_variable(&var_with(&[(
            ATT_VALID_RANGE,
            AttrValue::Numbers(vec![0.0, 40.0]),
        )]));
        assert!(conv.is_raw_valid(0.0));
        assert!(conv.is_raw_valid(40.0));
        assert!(!conv.is_raw_valid(-0.1));
        assert!(!conv.is_raw_valid(40.1));
    }

    #[test]
    fn test_nonfinite_range_ignored() {
        let conv = ValueConv::for_variable(&var_with(&[(
            ATT_VALID_RANGE,
            AttrValue::Numbers(vec![f64::NEG_INFINITY, 40.0]),
        )]));
        assert!(conv.is_raw_valid(-1e30));
    }

    #[test]
    fn test_single_sided_min() {
        let conv =
            ValueConv::for_variable(&var_with(&[(ATT_VALID_MIN, AttrValue::Number(0.0))]));
        assert!(!conv.is_raw_valid(-1.0));
        assert!(conv.is_raw_valid(1e12));
    }

    #[test]
    fn test_scale_and_offset() {
        let conv = ValueConv::for_variable(&var_with(&[
            (ATT_SCALE_FACTOR, AttrValue::Number(0.01)),
            (ATT_ADD_OFFSET, AttrValue::Number(20.0)),
        ]));
        assert_eq!(conv.apply(250.0), 22.5);
    }

    #[test]
    fn test_nan_always_invalid() {
        assert!(!ValueConv::identity().is_raw_valid(f64::NAN));
    }

    #[test]
    fn test_strip_log_unit() {
        assert_eq!(strip_log_unit("log(mg.m-3)"), ("mg.m-3".into(), true));
        assert_eq!(strip_log_unit("  LG( mg.m-3 ) "), ("mg.m-3".into(), true));
        assert_eq!(strip_log_unit("mg.m-3"), ("mg.m-3".into(), false));
    }

    #[test]
    fn test_meters_from_unit() {
        assert_eq!(meters_from_unit("km"), 1000.0);
        assert_eq!(meters_from_unit("CM"), 0.01);
        assert_eq!(meters_from_unit("m"), 1.0);
        assert_eq!(meters_from_unit("fathoms"), 1.0);
    }
}
