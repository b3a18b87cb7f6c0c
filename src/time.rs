//! # Time axis decoding
//!
//! Gridded sources express time as a numeric offset from a reference
//! instant, declared in a units string of the form `"<unit> since
//! <reference>"` (e.g. `"seconds since 2013-07-04 00:00:00"`). [`TimeCodec`]
//! reduces such a string to a millisecond multiplier and offset so that
//! decoding a raw coordinate is a single multiply-add, and produces
//! [`hifitime::Epoch`] instants.
//!
//! Two quirks of real-world files are handled here:
//!
//! - `"days since 00-01-00 00:00:00"` is the MATLAB datenum origin, not a
//!   gregorian date; it maps to a fixed offset of 719529 days before the Unix
//!   epoch.
//! - Files without a usable time axis often carry their acquisition time in a
//!   global attribute; [`global_attr_time`] probes the conventional candidate
//!   attributes in order.

use hifitime::Epoch;

use crate::constants::{
    DAYS_YEAR_ZERO_TO_1970, MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE, MILLIS_PER_SECOND,
};
use crate::dataset::{DataVariable, Dataset};
use crate::envgrid_errors::EnvgridError;

/// Units string assumed when a time variable declares none.
pub const DEFAULT_TIME_UNITS: &str = "days since 00-01-00 00:00:00";

/// Global attributes probed, in order, when a file has no usable time axis.
pub const TIME_ATTR_CANDIDATES: [&str; 7] = [
    "date_created",
    "time_coverage_end",
    "creation_time",
    "stop_time",
    "end_time",
    "time_coverage_start",
    "start_time",
];

/// Decoder for a numeric time coordinate: `instant_ms = raw * multiplier_ms
/// + offset_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeCodec {
    pub multiplier_ms: f64,
    pub offset_ms: f64,
}

impl TimeCodec {
    /// Parse a `"<unit> since <reference>"` units string.
    ///
    /// Arguments
    /// ---------
    /// * `units`: e.g. `"hours since 1950-01-01T00:00:00Z"`; the reference
    ///   accepts a date, an optional time (space- or `T`-separated), and an
    ///   optional numeric time zone (`+HH:MM`, `-HHMM`, `+H`)
    ///
    /// Return
    /// ------
    /// * `Some(TimeCodec)` on success, `None` for unrecognized strings
    pub fn parse(units: &str) -> Option<Self> {
        let normalized = units.trim().to_ascii_lowercase();
        if normalized == "days since 00-01-00 00:00:00" || normalized == "days since 00-01-00" {
            return Some(TimeCodec {
                multiplier_ms: MILLIS_PER_DAY,
                offset_ms: -DAYS_YEAR_ZERO_TO_1970 * MILLIS_PER_DAY,
            });
        }

        let tokens: Vec<&str> = units.split_whitespace().collect();
        if tokens.len() < 3 || !tokens[1].eq_ignore_ascii_case("since") {
            return None;
        }

        let multiplier_ms = match tokens[0].to_ascii_lowercase().as_str() {
            "milliseconds" | "millisecond" | "msec" | "ms" => 1.0,
            "seconds" | "second" | "sec" | "s" => MILLIS_PER_SECOND,
            "minutes" | "minute" | "min" => MILLIS_PER_MINUTE,
            "hours" | "hour" | "hr" | "h" => MILLIS_PER_HOUR,
            "days" | "day" | "d" => MILLIS_PER_DAY,
            _ => return None,
        };

        // Reference: date [time] [tz], with the ISO "T" form folding date and
        // time into one token.
        let (date_tok, mut rest) = match tokens[2].split_once('T') {
            Some((d, t)) => (d, vec![t]),
            None => (tokens[2], Vec::new()),
        };
        rest.extend_from_slice(&tokens[3..]);

        let (year, month, day) = parse_date(date_tok)?;

        let mut tz_ms = 0.0;
        let mut time_tok: Option<&str> = None;
        for tok in rest {
            if tok.is_empty() {
                continue;
            }
            if let Some(tz) = parse_tz(tok) {
                tz_ms = tz;
            } else if time_tok.is_none() {
                time_tok = Some(tok);
            }
        }

        let (hour, minute, sec, nanos) = match time_tok {
            Some(t) => parse_time(t.trim_end_matches(['Z', 'z']))?,
            None => (0, 0, 0, 0),
        };

        let reference =
            Epoch::maybe_from_gregorian_utc(year, month, day, hour, minute, sec, nanos).ok()?;
        Some(TimeCodec {
            multiplier_ms,
            offset_ms: reference.to_unix_milliseconds() - tz_ms,
        })
    }

    /// Codec for a time variable, falling back to [`DEFAULT_TIME_UNITS`] when
    /// the variable declares no units.
    pub fn for_variable<V: DataVariable>(var: &V, location: &str) -> Result<Self, EnvgridError> {
        let units = var
            .units()
            .unwrap_or_else(|| DEFAULT_TIME_UNITS.to_string());
        TimeCodec::parse(&units)
            .ok_or_else(|| EnvgridError::InvalidTimeUnits(units, location.to_string()))
    }

    /// Decode a raw coordinate to an instant, truncated to whole
    /// milliseconds.
    pub fn decode(&self, raw: f64) -> Epoch {
        epoch_from_millis((raw * self.multiplier_ms + self.offset_ms).trunc())
    }
}

/// Instant from Unix milliseconds.
pub fn epoch_from_millis(ms: f64) -> Epoch {
    Epoch::from_unix_milliseconds(ms)
}

/// The Unix epoch, used as the sentinel timestamp of last resort.
pub fn epoch_zero() -> Epoch {
    Epoch::from_unix_milliseconds(0.0)
}

/// Parse an ISO-8601-style instant (`2013-07-04T12:00:00Z`, with the time
/// part and the `Z` optional, space accepted as the separator).
pub fn parse_iso_instant(text: &str) -> Option<Epoch> {
    let text = text.trim().trim_end_matches(['Z', 'z']);
    let (date_tok, time_tok) = match text.split_once(['T', ' ']) {
        Some((d, t)) => (d, Some(t.trim())),
        None => (text, None),
    };
    let (year, month, day) = parse_date(date_tok)?;
    let (hour, minute, sec, nanos) = match time_tok.filter(|t| !t.is_empty()) {
        Some(t) => parse_time(t)?,
        None => (0, 0, 0, 0),
    };
    Epoch::maybe_from_gregorian_utc(year, month, day, hour, minute, sec, nanos).ok()
}

/// Probe the conventional global attributes for an acquisition time.
pub fn global_attr_time<D: Dataset>(ds: &D) -> Option<Epoch> {
    TIME_ATTR_CANDIDATES.iter().find_map(|name| {
        ds.attribute(name)
            .and_then(|a| a.as_str().and_then(parse_iso_instant))
    })
}

fn parse_date(tok: &str) -> Option<(i32, u8, u8)> {
    let mut parts = tok.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    Some((year, month, day))
}

fn parse_time(tok: &str) -> Option<(u8, u8, u8, u32)> {
    let mut parts = tok.splitn(3, ':');
    let hour: u8 = parts.next()?.parse().ok()?;
    let minute: u8 = parts.next()?.parse().ok()?;
    let sec_f: f64 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0.0,
    };
    let sec = sec_f.trunc();
    let nanos = ((sec_f - sec) * 1e9).round() as u32;
    Some((hour, minute, sec as u8, nanos))
}

/// Parse a numeric time-zone token (`+01:00`, `-0130`, `+2`); `Some` holds
/// the zone offset in milliseconds east of UTC.
fn parse_tz(tok: &str) -> Option<f64> {
    let (sign, rest) = match tok.as_bytes().first()? {
        b'+' => (1.0, &tok[1..]),
        b'-' => (-1.0, &tok[1..]),
        _ => return None,
    };
    if rest.is_empty() {
        return None;
    }
    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?)
    } else if rest.len() <= 2 {
        (rest.parse::<f64>().ok()?, 0.0)
    } else {
        let (h, m) = rest.split_at(rest.len() - 2);
        (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?)
    };
    Some(sign * (hours * MILLIS_PER_HOUR + minutes * MILLIS_PER_MINUTE))
}
