//! Shared in-memory dataset fixtures for the integration tests.
#![allow(dead_code)]

use envgrid::dataset::memory::{MemDataset, MemVariable};
use envgrid::dataset::NdArray;

pub const TIME_UNITS: &str = "seconds since 2013-07-04 00:00:00";

/// Unix milliseconds of the fixture time reference (2013-07-04T00:00:00Z).
pub const T0_MS: f64 = 1_372_896_000_000.0;

/// A dataset with `time`/`lat`/`lon` dimensions and their coordinate
/// variables, ready for a value variable to be added.
pub fn grid_frame(times: &[f64], lats: &[f64], lons: &[f64]) -> MemDataset {
    let (nt, ny, nx) = (times.len(), lats.len(), lons.len());
    let mut ds = MemDataset::new("mem://grid.nc");
    ds.add_dimension("time", nt)
        .add_dimension("lat", ny)
        .add_dimension("lon", nx);
    ds.add_variable(
        MemVariable::new(
            "time",
            &["time"],
            NdArray::new(times.to_vec(), vec![nt]).unwrap(),
        )
        .with_text_attr("standard_name", "time")
        .with_text_attr("units", TIME_UNITS),
    );
    ds.add_variable(
        MemVariable::new(
            "lat",
            &["lat"],
            NdArray::new(lats.to_vec(), vec![ny]).unwrap(),
        )
        .with_text_attr("standard_name", "latitude")
        .with_text_attr("units", "degrees_north"),
    );
    ds.add_variable(
        MemVariable::new(
            "lon",
            &["lon"],
            NdArray::new(lons.to_vec(), vec![nx]).unwrap(),
        )
        .with_text_attr("standard_name", "longitude")
        .with_text_attr("units", "degrees_east"),
    );
    ds
}

/// A plain `sst(time, lat, lon)` value variable.
pub fn sst_var(values: Vec<f64>, shape: Vec<usize>) -> MemVariable {
    MemVariable::new("sst", &["time", "lat", "lon"], NdArray::new(values, shape).unwrap())
        .with_text_attr("standard_name", "sea_water_temperature")
        .with_text_attr("long_name", "sea surface temperature")
        .with_text_attr("units", "degC")
}

/// A 1-D trajectory dataset: `lat`/`lon`/`time` and a value variable, all on
/// a shared `obs` dimension.
pub fn trajectory_dataset(
    times: &[f64],
    lats: &[f64],
    lons: &[f64],
    values: &[f64],
    value_units: &str,
) -> MemDataset {
    let n = values.len();
    let mut ds = MemDataset::new("mem://track.nc");
    ds.add_dimension("obs", n);
    ds.add_variable(
        MemVariable::new("time", &["obs"], NdArray::new(times.to_vec(), vec![n]).unwrap())
            .with_text_attr("units", TIME_UNITS),
    );
    ds.add_variable(MemVariable::new(
        "lat",
        &["obs"],
        NdArray::new(lats.to_vec(), vec![n]).unwrap(),
    ));
    ds.add_variable(MemVariable::new(
        "lon",
        &["obs"],
        NdArray::new(lons.to_vec(), vec![n]).unwrap(),
    ));
    ds.add_variable(
        MemVariable::new("chl", &["obs"], NdArray::new(values.to_vec(), vec![n]).unwrap())
            .with_text_attr("long_name", "chlorophyll concentration")
            .with_text_attr("units", value_units),
    );
    ds
}
