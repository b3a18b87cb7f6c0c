//! # Dataset abstraction layer
//!
//! The extraction pipeline never talks to a file format directly. It consumes
//! two small traits:
//!
//! - [`Dataset`]: a named container of dimensions, variables, optional groups
//!   and global attributes,
//! - [`DataVariable`]: a named array with dimensions, attributes and a bulk
//!   [`read`](DataVariable::read) returning an [`NdArray`].
//!
//! Any gridded source (a NetCDF reader, a GRIB reader, an in-memory fixture)
//! plugs in by implementing these two traits. The in-memory implementation
//! used by the test suite lives in [`memory`].

pub mod memory;
pub mod ndarray;

pub use ndarray::NdArray;

use crate::envgrid_errors::EnvgridError;

/// A named dimension with its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dim {
    pub name: String,
    pub len: usize,
}

impl Dim {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Dim {
            name: name.into(),
            len,
        }
    }
}

/// A variable or global attribute value.
///
/// Numeric attributes are widened to `f64` on the way in; schema heuristics
/// only ever need the numeric value or the text form.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
}

impl AttrValue {
    /// Numeric view: a `Number`, the first element of a `Numbers`, or a
    /// parseable `Text`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(v) => Some(*v),
            AttrValue::Numbers(vs) => vs.first().copied(),
            AttrValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Element `i` of a numeric-array attribute (`Number` acts as a
    /// one-element array).
    pub fn f64_at(&self, i: usize) -> Option<f64> {
        match self {
            AttrValue::Number(v) if i == 0 => Some(*v),
            AttrValue::Number(_) => None,
            AttrValue::Numbers(vs) => vs.get(i).copied(),
            AttrValue::Text(_) => None,
        }
    }

    /// Text view, `None` for numeric attributes.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A named array with CF-style attributes.
pub trait DataVariable {
    /// Short variable name as it appears in the container.
    fn name(&self) -> &str;

    /// Dimension names, outermost first, matching [`shape`](Self::shape).
    fn dimension_names(&self) -> Vec<String>;

    /// Per-axis lengths, outermost first.
    fn shape(&self) -> Vec<usize>;

    /// Attribute lookup by exact name.
    fn attribute(&self, name: &str) -> Option<AttrValue>;

    /// Bulk read of the whole array.
    ///
    /// Arrays are read once, up front, per extraction. A failure here aborts
    /// the extraction with [`EnvgridError::Read`].
    fn read(&self) -> Result<NdArray, EnvgridError>;

    /// The `units` attribute as text, if present.
    fn units(&self) -> Option<String> {
        self.attribute(crate::constants::ATT_UNITS)
            .and_then(|a| a.as_str().map(str::to_owned))
    }
}

/// A container of dimensions and variables.
pub trait Dataset {
    type Var: DataVariable;

    /// Human-readable source location (file path or synthetic name), used in
    /// error messages and point provenance.
    fn location(&self) -> &str;

    /// All dimensions declared by the container.
    fn dimensions(&self) -> Vec<Dim>;

    /// All top-level variables.
    fn variables(&self) -> Vec<&Self::Var>;

    /// Variable lookup by name, case-insensitive.
    fn variable(&self, name: &str) -> Option<&Self::Var> {
        self.variables()
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(name))
    }

    /// Variables of a named group, empty if the container has no such group.
    fn group_variables(&self, _group: &str) -> Vec<&Self::Var> {
        Vec::new()
    }

    /// Global attribute lookup by exact name.
    fn attribute(&self, name: &str) -> Option<AttrValue>;
}

#[cfg(test)]
mod attr_test {
    use super::*;

    #[test]
    fn test_attr_numeric_views() {
        assert_eq!(AttrValue::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(AttrValue::Numbers(vec![1.0, 9.0]).as_f64(), Some(1.0));
        assert_eq!(AttrValue::Text("  -3 ".into()).as_f64(), Some(-3.0));
        assert_eq!(AttrValue::Text("n/a".into()).as_f64(), None);
    }

    #[test]
    fn test_attr_indexed() {
        let a = AttrValue::Numbers(vec![0.0, 40.0]);
        assert_eq!(a.f64_at(0), Some(0.0));
        assert_eq!(a.f64_at(1), Some(40.0));
        assert_eq!(a.f64_at(2), None);
        assert_eq!(AttrValue::Number(5.0).f64_at(0), Some(5.0));
        assert_eq!(AttrValue::Number(5.0).f64_at(1), None);
    }
}
