//! yee-grid: per-axis grid generation for FDTD simulations
//!
//! This crate provides:
//! - Interval extraction from axis-aligned structures and mesh overrides
//! - Graded non-uniform meshing with a bounded step ratio
//! - Uniform and user supplied grids fitted to the simulation domain
//! - Symmetry folding and absorber (PML) padding
//!
//! All lengths are in µm. Every axis is generated independently; the
//! automatic grid sizes its steps from the free-space wavelength and the
//! refractive index of each medium.

pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod grid_spec;
pub mod medium;
pub mod mesher;
pub mod report;
pub mod spec1d;

pub use diagnostics::{Diagnostics, Warning, WarningKind};
pub use error::{GridError, Result};
pub use geometry::{Axis, BoxGeometry, Resolution, SnapPoint, Structure, Symmetry};
pub use grid::{Coords1D, Grid};
pub use grid_spec::{GridJob, GridSpec, MeshOutput, MeshRequest, Source};
pub use medium::{Medium, C_0};
pub use mesher::OverlapPolicy;
pub use report::render_grid_report;
pub use spec1d::{AutoGrid, GridSpec1d};

use std::fs;
use std::path::Path;

/// Main entry point: parse a JSON grid job and build its grid
pub fn generate(json: &str) -> Result<MeshOutput> {
    let job: GridJob = serde_json::from_str(json)?;
    job.run()
}

/// Read a grid job from a JSON file
pub fn load_job(path: impl AsRef<Path>) -> Result<GridJob> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
