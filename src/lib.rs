//! # envgrid
//!
//! **envgrid** turns gridded environmental datasets (model output, remote
//! sensing products, survey grids) into sparse, deduplicated, time-indexed
//! collections of georeferenced points, ready for display or further
//! analysis.
//!
//! The pipeline, per requested variable:
//!
//! 1. **Resolution** ([`resolve`]): locate the value variable by CF
//!    `standard_name` or short name, then its latitude/longitude/time/depth
//!    axes through a cascade of naming heuristics. Missing lat/lon is a hard
//!    failure; missing time/depth degrades gracefully.
//! 2. **Scan** ([`scan`]): walk the variable's full index space in row-major
//!    order; per cell, decode the timestamp, validate and scale the
//!    coordinates and the value (fill values, valid ranges,
//!    `scale_factor`/`add_offset`, `log(...)` units), apply the caller's
//!    lat/lon/depth filters, and merge accepted samples into an
//!    identity-keyed point map with `(timestamp, depth)` history dedup.
//! 3. **Gradient** (optional): estimate horizontal gradient magnitudes over
//!    gridded variables with a one-row stencil buffer.
//!
//! Datasets plug in through the [`dataset`] traits; an in-memory
//! implementation ships for tests and in-process producers. Plain `X,Y,Z`
//! text grids load through [`textgrid`], and slow loads can be pushed to a
//! background thread with [`task::spawn_load`].
//!
//! ## Example
//!
//! ```no_run
//! use envgrid::{extract_variable, ExtractFilter};
//! use envgrid::dataset::memory::MemDataset;
//!
//! # fn demo(ds: &MemDataset) -> Result<(), envgrid::EnvgridError> {
//! let filter = ExtractFilter {
//!     lat_range: Some((35.0, 45.0)),
//!     lon_range: Some((-12.0, 0.0)),
//!     compute_gradient: true,
//!     ..Default::default()
//! };
//! let out = extract_variable(ds, "sea_water_temperature", &filter)?;
//! for point in out.points.values() {
//!     println!("{} {} -> {}", point.lat, point.lon, point.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod dataset;
pub mod envgrid_errors;
mod gradient;
pub mod index_map;
pub mod points;
pub mod resolve;
pub mod scan;
pub mod task;
pub mod textgrid;
pub mod time;
pub mod validity;

pub use constants::{GridCounter, PointMap};
pub use dataset::{AttrValue, DataVariable, Dataset, Dim, NdArray};
pub use envgrid_errors::EnvgridError;
pub use points::{point_id, DataPoint, Sample, VarInfo, VarType};
pub use scan::{
    extract_variable, extract_variable_parallel, normalize_deg180, ExtractFilter, Extraction,
};
pub use task::{spawn_load, LoadHandle};
pub use textgrid::{load_xyz, load_xyz_file};
pub use time::TimeCodec;
