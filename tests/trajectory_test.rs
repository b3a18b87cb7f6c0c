//! Trajectory extraction, history dedup, log units, time fallbacks, and
//! sequential/parallel equivalence.

mod common;

use approx::assert_relative_eq;
use envgrid::dataset::memory::{MemDataset, MemVariable};
use envgrid::dataset::{AttrValue, NdArray};
use envgrid::time::{epoch_from_millis, epoch_zero};
use envgrid::{
    extract_variable, extract_variable_parallel, point_id, ExtractFilter, VarType,
};

use common::{grid_frame, sst_var, trajectory_dataset, T0_MS, TIME_UNITS};

#[test]
fn test_trajectory_extraction() {
    let ds = trajectory_dataset(
        &[0.0, 60.0, 120.0],
        &[41.10, 41.11, 41.12],
        &[-8.70, -8.71, -8.72],
        &[1.5, 1.6, 1.7],
        "mg.m-3",
    );
    let out = extract_variable(&ds, "chl", &ExtractFilter::default()).unwrap();
    assert_eq!(out.info.var_type, VarType::GeoTrajectory);
    assert_eq!(out.points.len(), 3);

    let p = &out.points[&point_id(41.11, -8.71)];
    assert_eq!(p.value, 1.6);
    assert_eq!(p.time, epoch_from_millis(T0_MS + 60_000.0));
    // Trajectories keep the full counter.
    assert_eq!(p.indexes_xy.as_ref().unwrap().as_slice(), &[1]);

    assert_eq!(out.from_date, Some(epoch_from_millis(T0_MS)));
    assert_eq!(out.to_date, Some(epoch_from_millis(T0_MS + 120_000.0)));
}

#[test]
fn test_revisited_position_builds_history() {
    // The platform passes the same spot twice at different times.
    let ds = trajectory_dataset(
        &[0.0, 60.0],
        &[41.10, 41.10],
        &[-8.70, -8.70],
        &[1.5, 2.5],
        "mg.m-3",
    );
    let out = extract_variable(&ds, "chl", &ExtractFilter::default()).unwrap();
    assert_eq!(out.points.len(), 1);
    let p = &out.points[&point_id(41.10, -8.70)];
    assert_eq!(p.history().len(), 2);
    // Canonical fields come from the first accepted sample.
    assert_eq!(p.value, 1.5);
    assert_eq!(p.indexes_xy.as_ref().unwrap().as_slice(), &[0]);
}

#[test]
fn test_duplicate_time_depth_dropped() {
    // Same identity, same timestamp, no depth axis: the second sample is a
    // duplicate even though its value differs.
    let ds = trajectory_dataset(
        &[0.0, 0.0],
        &[41.10, 41.10],
        &[-8.70, -8.70],
        &[1.5, 9.9],
        "mg.m-3",
    );
    let out = extract_variable(&ds, "chl", &ExtractFilter::default()).unwrap();
    let p = &out.points[&point_id(41.10, -8.70)];
    assert_eq!(p.history().len(), 1);
    assert_eq!(p.history()[0].value, 1.5);
}

#[test]
fn test_log_units_unlogged() {
    let ds = trajectory_dataset(&[0.0], &[41.10], &[-8.70], &[2.0], "log(mg.m-3)");
    let out = extract_variable(&ds, "chl", &ExtractFilter::default()).unwrap();
    assert!(out.info.log_scaled);
    assert_eq!(out.info.unit, "mg.m-3");
    assert_relative_eq!(out.points[&point_id(41.10, -8.70)].value, 100.0);
    assert_relative_eq!(out.info.min_val, 100.0);
}

#[test]
fn test_global_attr_time_fallback() {
    // No time variable at all: the file-level attribute supplies the date.
    let mut ds = MemDataset::new("mem://notime.nc");
    ds.add_dimension("lat", 1).add_dimension("lon", 1);
    ds.add_variable(MemVariable::new(
        "lat",
        &["lat"],
        NdArray::new(vec![10.0], vec![1]).unwrap(),
    ));
    ds.add_variable(MemVariable::new(
        "lon",
        &["lon"],
        NdArray::new(vec![-8.0], vec![1]).unwrap(),
    ));
    ds.add_variable(MemVariable::new(
        "sst",
        &["lat", "lon"],
        NdArray::new(vec![15.0], vec![1, 1]).unwrap(),
    ));
    ds.set_attribute(
        "date_created",
        AttrValue::Text("2013-07-04T00:00:00Z".into()),
    );

    let out = extract_variable(&ds, "sst", &ExtractFilter::default()).unwrap();
    let p = &out.points[&point_id(10.0, -8.0)];
    assert_eq!(p.time, epoch_from_millis(T0_MS));
    assert_eq!(out.from_date, Some(epoch_from_millis(T0_MS)));
}

#[test]
fn test_date_limit_degrades_timestamp() {
    let mut ds = grid_frame(&[0.0], &[10.0], &[-8.0]);
    ds.add_variable(sst_var(vec![15.0], vec![1, 1, 1]));
    // The coordinate time (2013) is older than the limit (2014); the cell is
    // still accepted, with the fallback timestamp.
    let filter = ExtractFilter {
        date_limit: Some(epoch_from_millis(1_400_000_000_000.0)),
        ..Default::default()
    };
    let out = extract_variable(&ds, "sst", &filter).unwrap();
    assert_eq!(out.cells_accepted, 1);
    let p = &out.points[&point_id(10.0, -8.0)];
    assert_eq!(p.time, epoch_zero());
}

#[test]
fn test_unmatched_time_axis_falls_back_to_attr() {
    // The time variable lives on its own dimension, matching no axis of the
    // scanned variable by name or length. Its values must not leak into the
    // timestamps; the file-level attribute supplies the date instead.
    let mut ds = MemDataset::new("mem://odd.nc");
    ds.add_dimension("lat", 1)
        .add_dimension("lon", 1)
        .add_dimension("record", 3);
    ds.add_variable(MemVariable::new(
        "lat",
        &["lat"],
        NdArray::new(vec![10.0], vec![1]).unwrap(),
    ));
    ds.add_variable(MemVariable::new(
        "lon",
        &["lon"],
        NdArray::new(vec![-8.0], vec![1]).unwrap(),
    ));
    ds.add_variable(
        MemVariable::new(
            "time",
            &["record"],
            NdArray::new(vec![86_400.0, 172_800.0, 259_200.0], vec![3]).unwrap(),
        )
        .with_text_attr("units", TIME_UNITS),
    );
    ds.add_variable(MemVariable::new(
        "sst",
        &["lat", "lon"],
        NdArray::new(vec![15.0], vec![1, 1]).unwrap(),
    ));
    ds.set_attribute(
        "date_created",
        AttrValue::Text("2020-01-01T00:00:00Z".into()),
    );

    let out = extract_variable(&ds, "sst", &ExtractFilter::default()).unwrap();
    let p = &out.points[&point_id(10.0, -8.0)];
    assert_eq!(p.time, epoch_from_millis(1_577_836_800_000.0));
    assert_eq!(out.from_date, Some(epoch_from_millis(1_577_836_800_000.0)));
}

#[test]
fn test_date_limit_guards_attr_fallback() {
    // A file-level attribute date older than the limit counts as absent, so
    // the timestamp degrades all the way to epoch 0.
    let mut ds = MemDataset::new("mem://notime.nc");
    ds.add_dimension("lat", 1).add_dimension("lon", 1);
    ds.add_variable(MemVariable::new(
        "lat",
        &["lat"],
        NdArray::new(vec![10.0], vec![1]).unwrap(),
    ));
    ds.add_variable(MemVariable::new(
        "lon",
        &["lon"],
        NdArray::new(vec![-8.0], vec![1]).unwrap(),
    ));
    ds.add_variable(MemVariable::new(
        "sst",
        &["lat", "lon"],
        NdArray::new(vec![15.0], vec![1, 1]).unwrap(),
    ));
    ds.set_attribute(
        "date_created",
        AttrValue::Text("2013-07-04T00:00:00Z".into()),
    );

    let filter = ExtractFilter {
        date_limit: Some(epoch_from_millis(1_400_000_000_000.0)),
        ..Default::default()
    };
    let out = extract_variable(&ds, "sst", &filter).unwrap();
    assert_eq!(out.cells_accepted, 1);
    assert_eq!(out.points[&point_id(10.0, -8.0)].time, epoch_zero());
}

#[test]
fn test_parallel_matches_sequential() {
    let mut ds = grid_frame(
        &[0.0, 3_600.0],
        &[10.0, 20.0],
        &[-8.0, -7.0],
    );
    // Two time steps over the same positions: every identity collects a
    // two-entry history.
    ds.add_variable(sst_var(
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        vec![2, 2, 2],
    ));

    let filter = ExtractFilter::default();
    let seq = extract_variable(&ds, "sst", &filter).unwrap();
    let par = extract_variable_parallel(&ds, "sst", &filter).unwrap();

    assert_eq!(seq.points.len(), par.points.len());
    for (id, sp) in &seq.points {
        let pp = &par.points[id];
        assert_eq!(pp.value, sp.value);
        assert_eq!(pp.time, sp.time);
        assert_eq!(pp.indexes_xy, sp.indexes_xy);
        assert_eq!(pp.history().len(), sp.history().len());
        for (a, b) in pp.history().iter().zip(sp.history()) {
            assert_eq!(a.time, b.time);
            assert_eq!(a.value, b.value);
        }
    }
    assert_eq!(seq.cells_accepted, par.cells_accepted);
    assert_eq!(seq.from_date, par.from_date);
    assert_eq!(seq.to_date, par.to_date);
    assert_eq!(seq.info.min_val, par.info.min_val);
    assert_eq!(seq.info.max_val, par.info.max_val);

    let p = &par.points[&point_id(20.0, -7.0)];
    assert_eq!(p.history().len(), 2);
    assert_eq!(p.value, 4.0);
}
