//! # X,Y,Z text grid loader
//!
//! Reads line-oriented coordinate files: one point per line, two angle
//! columns followed by a value column, whitespace/comma/semicolon
//! separated. Column order is caller-declared (`lon lat value` or
//! `lat lon value`). Such files carry no time or depth axis; samples get
//! synthetic timestamps (the Unix epoch plus one millisecond per accepted
//! line) so the history-dedup rules still hold. Malformed lines are skipped
//! individually.

use std::fs::File;
use std::io::{BufRead, BufReader};

use camino::Utf8Path;
use log::{debug, info};

use crate::constants::PointMap;
use crate::envgrid_errors::EnvgridError;
use crate::points::{point_id, DataPoint, Sample, VarInfo, VarType};
use crate::scan::{normalize_deg180, Extraction, ExtractFilter};
use crate::time::epoch_from_millis;

const COMMENT_PREFIXES: [char; 5] = ['#', '%', ';', '/', '*'];

fn in_range(v: f64, range: Option<(f64, f64)>) -> bool {
    match range {
        None => true,
        Some((lo, hi)) => (!lo.is_finite() || v >= lo) && (!hi.is_finite() || v <= hi),
    }
}

/// Load an X,Y,Z file from a reader.
///
/// Arguments
/// ---------
/// * `reader`: line source
/// * `file_name`: provenance label for the result
/// * `lon_lat_order`: `true` when columns are `lon lat value`, `false` for
///   `lat lon value`
/// * `filter`: only the lat/lon ranges apply; date, depth and gradient
///   options are ignored (the format carries neither axis)
pub fn load_xyz<R: BufRead>(
    reader: R,
    file_name: &str,
    lon_lat_order: bool,
    filter: &ExtractFilter,
) -> Result<Extraction, EnvgridError> {
    let mut points = PointMap::default();
    let mut info = xyz_info(file_name);
    let mut accepted = 0usize;
    let mut malformed = 0usize;
    let mut total = 0usize;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIXES.as_slice()) {
            continue;
        }
        total += 1;

        let tokens: Vec<&str> = trimmed
            .split(|c: char| c.is_ascii_whitespace() || c == ',' || c == ';')
            .filter(|t| !t.is_empty())
            .take(4)
            .collect();
        let parsed: Option<(f64, f64, f64)> = match tokens.as_slice() {
            [a, b, c, ..] => match (a.parse(), b.parse(), c.parse()) {
                (Ok(a), Ok(b), Ok(c)) => Some((a, b, c)),
                _ => None,
            },
            _ => None,
        };
        let Some((first, second, value)) = parsed else {
            malformed += 1;
            continue;
        };

        let (lat, lon) = if lon_lat_order {
            (second, first)
        } else {
            (first, second)
        };
        let lat = normalize_deg180(lat);
        let lon = normalize_deg180(lon);
        if !in_range(lat, filter.lat_range) || !in_range(lon, filter.lon_range) {
            continue;
        }

        let time = epoch_from_millis(accepted as f64);
        let sample = Sample {
            time,
            depth: f64::NAN,
            value,
        };
        let entry = points.entry(point_id(lat, lon)).or_insert_with(|| {
            let mut p = DataPoint::new(lat, lon);
            p.time = time;
            p.depth = f64::NAN;
            p.value = value;
            p
        });
        entry.push_history(sample);

        info.note_value(value);
        info.note_date(time);
        accepted += 1;
    }

    if malformed > 0 {
        debug!("{file_name}: skipped {malformed} malformed lines");
    }
    info!("{file_name}: accepted {accepted} of {total} lines into {} points", points.len());

    let (from_date, to_date) = (info.min_date, info.max_date);
    Ok(Extraction {
        points,
        info,
        from_date,
        to_date,
        cells_total: total,
        cells_accepted: accepted,
    })
}

/// Load an X,Y,Z file from disk. See [`load_xyz`].
pub fn load_xyz_file(
    path: &Utf8Path,
    lon_lat_order: bool,
    filter: &ExtractFilter,
) -> Result<Extraction, EnvgridError> {
    let reader = BufReader::new(File::open(path)?);
    load_xyz(reader, path.as_str(), lon_lat_order, filter)
}

fn xyz_info(file_name: &str) -> VarInfo {
    VarInfo {
        name: "xyz".to_string(),
        full_name: file_name.to_string(),
        standard_name: None,
        unit: String::new(),
        log_scaled: false,
        comment: None,
        var_type: VarType::Geo2d,
        file_name: file_name.to_string(),
        size_xy: None,
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
