//! # Variable and coordinate resolution
//!
//! Real gridded files are inconsistent about how they name things.
//! [`find_value_variable`] locates the requested variable by CF
//! `standard_name` first and short name second, both case-insensitive.
//! [`resolve_coordinates`] then locates the latitude, longitude, time and
//! depth axes that georeference it, running a fixed cascade of heuristics
//! per role:
//!
//! 1. a coordinate variable (one named after a dimension of the value
//!    variable) whose `standard_name` matches the role,
//! 2. any variable whose short name matches the role's synonym set,
//! 3. for lat/lon only: the conventional `navigation_data` group, then any
//!    variable with the role's `standard_name` spanning a subset of the
//!    value variable's dimensions, and as a last resort any
//!    dimension-coordinate variable carrying the
//!    `degrees_north`/`degrees_east` units strings.
//!
//! Latitude and longitude are hard preconditions; time and depth degrade
//! gracefully when absent.

use crate::constants::{ATT_STANDARD_NAME, GRP_NAVIGATION_DATA, LAT_UNITS, LON_UNITS};
use crate::dataset::{DataVariable, Dataset};
use crate::envgrid_errors::EnvgridError;

/// The coordinate axes a scanned variable can be paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordRole {
    Lat,
    Lon,
    Time,
    Depth,
}

impl CoordRole {
    /// CF `standard_name` values accepted for this role.
    fn standard_names(self) -> &'static [&'static str] {
        match self {
            CoordRole::Lat => &["latitude"],
            CoordRole::Lon => &["longitude"],
            CoordRole::Time => &["time", "ocean_time"],
            CoordRole::Depth => &["depth"],
        }
    }

    /// Short-name synonyms accepted for this role.
    fn short_names(self) -> &'static [&'static str] {
        match self {
            CoordRole::Lat => &["lat", "latitude"],
            CoordRole::Lon => &["lon", "longitude"],
            CoordRole::Time => &["time", "ocean_time"],
            CoordRole::Depth => &["depth"],
        }
    }

    /// Units strings accepted in the lat/lon last-resort pass.
    fn unit_names(self) -> &'static [&'static str] {
        match self {
            CoordRole::Lat => &LAT_UNITS,
            CoordRole::Lon => &LON_UNITS,
            _ => &[],
        }
    }
}

/// The coordinate variables resolved for one value variable.
#[derive(Debug)]
pub struct Coordinates<'a, D: Dataset> {
    pub lat: &'a D::Var,
    pub lon: &'a D::Var,
    pub time: Option<&'a D::Var>,
    pub depth: Option<&'a D::Var>,
}

/// Locate the requested value variable: `standard_name` match first, short
/// name second, both case-insensitive.
pub fn find_value_variable<'a, D: Dataset>(ds: &'a D, name: &str) -> Option<&'a D::Var> {
    ds.variables()
        .into_iter()
        .find(|v| {
            v.attribute(ATT_STANDARD_NAME)
                .and_then(|a| a.as_str().map(|s| s.eq_ignore_ascii_case(name)))
                .unwrap_or(false)
        })
        .or_else(|| ds.variable(name))
}

fn has_standard_name<V: DataVariable>(var: &V, names: &[&str]) -> bool {
    var.attribute(ATT_STANDARD_NAME)
        .and_then(|a| {
            a.as_str()
                .map(|s| names.iter().any(|n| s.eq_ignore_ascii_case(n)))
        })
        .unwrap_or(false)
}

fn dims_contained_in(inner: &[String], outer: &[String]) -> bool {
    inner
        .iter()
        .all(|d| outer.iter().any(|o| o.eq_ignore_ascii_case(d)))
}

fn has_units<V: DataVariable>(var: &V, units: &[&str]) -> bool {
    var.units()
        .map(|u| units.iter().any(|n| u.trim().eq_ignore_ascii_case(n)))
        .unwrap_or(false)
}

/// One step of the resolution cascade. Each step is independently testable
/// and ignorant of the others; [`resolve_coordinate`] tries them in the
/// fixed documented order, first success wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// A coordinate variable of one of the value variable's dimensions,
    /// matched by `standard_name`.
    DimStandardName,
    /// Any variable matched by the role's short-name synonym set.
    ShortName,
    /// The conventional `navigation_data` group (lat/lon only).
    NavGroup,
    /// Any variable with the role's `standard_name` whose dimensions are a
    /// subset of the value variable's (lat/lon only; catches 2-D curvilinear
    /// axes under nonstandard names).
    DimsSubsetSearch,
    /// Any dimension-coordinate variable with the role's units string
    /// (lat/lon only).
    UnitsFallback,
}

/// The cascade, in resolution order.
pub const RESOLVE_CASCADE: [ResolveStrategy; 5] = [
    ResolveStrategy::DimStandardName,
    ResolveStrategy::ShortName,
    ResolveStrategy::NavGroup,
    ResolveStrategy::DimsSubsetSearch,
    ResolveStrategy::UnitsFallback,
];

impl ResolveStrategy {
    /// Try this one heuristic for a role.
    pub fn try_resolve<'a, D: Dataset>(
        self,
        ds: &'a D,
        value_var: &D::Var,
        role: CoordRole,
    ) -> Option<&'a D::Var> {
        match self {
            ResolveStrategy::DimStandardName => {
                value_var.dimension_names().iter().find_map(|dim| {
                    ds.variable(dim)
                        .filter(|v| has_standard_name(*v, role.standard_names()))
                })
            }
            ResolveStrategy::ShortName => role
                .short_names()
                .iter()
                .find_map(|name| ds.variable(name)),
            ResolveStrategy::NavGroup => {
                if !matches!(role, CoordRole::Lat | CoordRole::Lon) {
                    return None;
                }
                ds.group_variables(GRP_NAVIGATION_DATA)
                    .into_iter()
                    .find(|v| {
                        has_standard_name(*v, role.standard_names())
                            || role
                                .short_names()
                                .iter()
                                .any(|n| v.name().eq_ignore_ascii_case(n))
                    })
            }
            ResolveStrategy::DimsSubsetSearch => {
                if !matches!(role, CoordRole::Lat | CoordRole::Lon) {
                    return None;
                }
                let value_dims = value_var.dimension_names();
                ds.variables().into_iter().find(|v| {
                    has_standard_name(*v, role.standard_names())
                        && dims_contained_in(&v.dimension_names(), &value_dims)
                })
            }
            ResolveStrategy::UnitsFallback => {
                if !matches!(role, CoordRole::Lat | CoordRole::Lon) {
                    return None;
                }
                ds.dimensions().iter().find_map(|dim| {
                    ds.variable(&dim.name)
                        .filter(|v| has_units(*v, role.unit_names()))
                })
            }
        }
    }
}

/// Resolve one coordinate role for a value variable, or `None` if the
/// cascade exhausts.
pub fn resolve_coordinate<'a, D: Dataset>(
    ds: &'a D,
    value_var: &D::Var,
    role: CoordRole,
) -> Option<&'a D::Var> {
    RESOLVE_CASCADE
        .iter()
        .find_map(|s| s.try_resolve(ds, value_var, role))
}

/// Resolve all coordinate axes for a value variable.
///
/// Arguments
/// ---------
/// * `requested_name`: the name the caller asked to extract; when it denotes
///   depth, depth resolution is skipped so the axis is not paired with
///   itself
///
/// Return
/// ------
/// * `Ok(Coordinates)` with lat/lon resolved; time and depth may be `None`
/// * `Err(EnvgridError::NotGeoreferenced)` when lat or lon cannot be found
pub fn resolve_coordinates<'a, D: Dataset>(
    ds: &'a D,
    value_var: &D::Var,
    requested_name: &str,
) -> Result<Coordinates<'a, D>, EnvgridError> {
    let not_geo = || {
        EnvgridError::NotGeoreferenced(value_var.name().to_string(), ds.location().to_string())
    };
    let lat = resolve_coordinate(ds, value_var, CoordRole::Lat).ok_or_else(not_geo)?;
    let lon = resolve_coordinate(ds, value_var, CoordRole::Lon).ok_or_else(not_geo)?;
    let time = resolve_coordinate(ds, value_var, CoordRole::Time);
    let depth = if requested_name.eq_ignore_ascii_case("depth") {
        None
    } else {
        resolve_coordinate(ds, value_var, CoordRole::Depth)
    };
    Ok(Coordinates {
        lat,
        lon,
        time,
        depth,
    })
}
