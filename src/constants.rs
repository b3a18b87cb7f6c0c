//! # Constants and type definitions for envgrid
//!
//! This module centralizes the **attribute-name conventions**, **unit
//! conversion factors**, and **common type definitions** used throughout the
//! `envgrid` library.
//!
//! ## Overview
//!
//! - CF-style attribute names used by the schema-discovery heuristics
//! - Recognized units strings for the latitude/longitude last-resort match
//! - Core type aliases used across the crate
//! - The container type for extracted point collections
//!
//! These definitions are used by all main modules, including the variable
//! resolver, the grid scan, and the text-grid loader.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::points::DataPoint;

// -------------------------------------------------------------------------------------------------
// Dataset attribute conventions
// -------------------------------------------------------------------------------------------------

/// CF `standard_name` attribute
pub const ATT_STANDARD_NAME: &str = "standard_name";

/// CF `long_name` attribute
pub const ATT_LONG_NAME: &str = "long_name";

/// Primary fill-value attribute
pub const ATT_FILL_VALUE: &str = "_FillValue";

/// Fallback fill-value attribute
pub const ATT_MISSING_VALUE: &str = "missing_value";

/// Two-element valid range attribute
pub const ATT_VALID_RANGE: &str = "valid_range";

/// Lower valid bound attribute
pub const ATT_VALID_MIN: &str = "valid_min";

/// Upper valid bound attribute
pub const ATT_VALID_MAX: &str = "valid_max";

/// Units attribute
pub const ATT_UNITS: &str = "units";

/// Linear scale factor attribute
pub const ATT_SCALE_FACTOR: &str = "scale_factor";

/// Linear offset attribute
pub const ATT_ADD_OFFSET: &str = "add_offset";

/// Free-text comment attribute
pub const ATT_COMMENT: &str = "comment";

/// Group conventionally holding navigation (lat/lon) variables
pub const GRP_NAVIGATION_DATA: &str = "navigation_data";

/// Units strings recognized as marking a latitude coordinate
pub const LAT_UNITS: [&str; 2] = ["degrees_north", "degree_north"];

/// Units strings recognized as marking a longitude coordinate
pub const LON_UNITS: [&str; 2] = ["degrees_east", "degree_east"];

// -------------------------------------------------------------------------------------------------
// Time and numeric constants
// -------------------------------------------------------------------------------------------------

/// Milliseconds in a second
pub const MILLIS_PER_SECOND: f64 = 1_000.0;

/// Milliseconds in a minute
pub const MILLIS_PER_MINUTE: f64 = 60.0 * MILLIS_PER_SECOND;

/// Milliseconds in an hour
pub const MILLIS_PER_HOUR: f64 = 60.0 * MILLIS_PER_MINUTE;

/// Milliseconds in a day
pub const MILLIS_PER_DAY: f64 = 24.0 * MILLIS_PER_HOUR;

/// Days from the year-zero reference (`00-01-00`, the MATLAB datenum origin)
/// to the Unix epoch, used by the `days since 00-01-00 00:00:00` time units.
pub const DAYS_YEAR_ZERO_TO_1970: f64 = 719_529.0;

/// Relative tolerance used when comparing a raw value against a fill value
pub const FILL_EPS: f64 = 1e-9;

/// Decimal digits of the rounded lat/lon identity key
pub const ID_DECIMAL_DIGITS: usize = 8;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Distance in meters
pub type Meter = f64;

/// N-dimensional grid position (inline-optimized for the usual ranks)
pub type GridCounter = SmallVec<[usize; 6]>;

/// Extraction result container: rounded lat/lon identity → canonical point
pub type PointMap = HashMap<String, DataPoint, ahash::RandomState>;
