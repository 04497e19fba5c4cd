//! Grid specification for all three axes and the simulation inputs it is
//! evaluated against.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, WarningKind};
use crate::error::{GridError, Result};
use crate::geometry::{Axis, SnapPoint, Structure, Symmetry};
use crate::grid::{Coords1D, Grid};
use crate::medium::C_0;
use crate::spec1d::{isclose, AutoGrid, AxisInputs, GridSpec1d};

/// Excitation source; only its central frequency matters for meshing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub name: String,
    /// Central frequency (Hz)
    pub freq0: f64,
}

impl Source {
    pub fn new(name: impl Into<String>, freq0: f64) -> Self {
        Self {
            name: name.into(),
            freq0,
        }
    }
}

/// Simulation parameters a [`GridSpec`] is evaluated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshRequest {
    /// Simulation domain carrying the background medium, followed by the
    /// structures in increasing priority
    pub structures: Vec<Structure>,
    #[serde(default)]
    pub symmetry: [Symmetry; 3],
    #[serde(default)]
    pub periodic: [bool; 3],
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Absorber cells on the low and high side of each axis
    #[serde(default)]
    pub num_pml_layers: [(usize, usize); 3],
}

impl MeshRequest {
    pub fn new(structures: Vec<Structure>) -> Self {
        Self {
            structures,
            symmetry: [0; 3],
            periodic: [false; 3],
            sources: Vec::new(),
            num_pml_layers: [(0, 0); 3],
        }
    }
}

/// Generated grid together with the warnings raised on the way
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshOutput {
    pub grid: Grid,
    pub diagnostics: Diagnostics,
}

/// How the grid is built along x, y and z
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub grid_x: GridSpec1d,
    pub grid_y: GridSpec1d,
    pub grid_z: GridSpec1d,
    /// Free-space wavelength (µm) for automatic grids. Derived from the
    /// sources when absent.
    pub wavelength: Option<f64>,
    /// Structures added on top of the simulation structures for meshing only
    pub override_structures: Vec<Structure>,
    /// Points the boundaries must pass through
    pub snapping_points: Vec<SnapPoint>,
}

impl GridSpec {
    /// The same automatic grid along every axis
    pub fn auto(wavelength: Option<f64>, settings: AutoGrid) -> Self {
        let grid_1d = GridSpec1d::Auto(settings);
        Self {
            grid_x: grid_1d.clone(),
            grid_y: grid_1d.clone(),
            grid_z: grid_1d,
            wavelength,
            ..Self::default()
        }
    }

    /// The same uniform step along every axis
    pub fn uniform(dl: f64) -> Self {
        let grid_1d = GridSpec1d::Uniform { dl };
        Self {
            grid_x: grid_1d.clone(),
            grid_y: grid_1d.clone(),
            grid_z: grid_1d,
            ..Self::default()
        }
    }

    /// Reuse the boundaries of an existing grid
    pub fn from_grid(grid: &Grid) -> Self {
        let boundaries = |axis: Axis| GridSpec1d::CustomBoundaries {
            coords: grid.axis(axis).as_slice().to_vec(),
        };
        Self {
            grid_x: boundaries(Axis::X),
            grid_y: boundaries(Axis::Y),
            grid_z: boundaries(Axis::Z),
            ..Self::default()
        }
    }

    pub fn with_override_structures(mut self, structures: Vec<Structure>) -> Self {
        self.override_structures = structures;
        self
    }

    pub fn with_snapping_points(mut self, points: Vec<SnapPoint>) -> Self {
        self.snapping_points = points;
        self
    }

    pub fn axis(&self, axis: Axis) -> &GridSpec1d {
        match axis {
            Axis::X => &self.grid_x,
            Axis::Y => &self.grid_y,
            Axis::Z => &self.grid_z,
        }
    }

    pub fn auto_grid_used(&self) -> bool {
        Axis::ALL.iter().any(|&axis| self.axis(axis).is_auto())
    }

    pub fn custom_grid_used(&self) -> bool {
        Axis::ALL.iter().any(|&axis| self.axis(axis).is_custom())
    }

    /// Per axis, whether any override structure sets a step along it
    pub fn override_structures_used(&self) -> [bool; 3] {
        Axis::ALL.map(|axis| self.override_structures.iter().any(|s| s.acts_on(axis)))
    }

    /// Free-space wavelength (µm) from the common central frequency of `sources`
    pub fn wavelength_from_sources(sources: &[Source]) -> Result<f64> {
        let first = sources.first().ok_or_else(|| {
            GridError::config("automatic grid generation requires a wavelength or sources")
        })?;
        if !(first.freq0 > 0.0) {
            return Err(GridError::config(format!(
                "source '{}' has a non-positive central frequency {}",
                first.name, first.freq0
            )));
        }
        if sources.iter().any(|s| !isclose(s.freq0, first.freq0)) {
            return Err(GridError::config(
                "sources of different central frequencies are supplied; \
                 set a wavelength on the grid specification",
            ));
        }
        Ok(C_0 / first.freq0)
    }

    fn resolve_wavelength(&self, sources: &[Source]) -> Result<Option<f64>> {
        match self.wavelength {
            Some(wavelength) if wavelength > 0.0 => Ok(Some(wavelength)),
            Some(wavelength) => Err(GridError::config(format!(
                "wavelength must be positive, got {wavelength}"
            ))),
            None if self.auto_grid_used() => {
                let wavelength = Self::wavelength_from_sources(sources)?;
                tracing::info!(wavelength, "auto meshing using wavelength defined from sources");
                Ok(Some(wavelength))
            }
            None => Ok(None),
        }
    }

    /// Build the grid along all three axes.
    ///
    /// Axes are generated in parallel; warnings are returned in axis order.
    pub fn make_grid(&self, request: &MeshRequest) -> Result<MeshOutput> {
        if let Some(sym) = request.symmetry.iter().find(|s| !(-1..=1).contains(*s)) {
            return Err(GridError::config(format!(
                "symmetry values must be -1, 0 or 1, got {sym}"
            )));
        }
        for axis in Axis::ALL {
            self.axis(axis).validate(axis)?;
        }
        let wavelength = self.resolve_wavelength(&request.sources)?;

        let mut diagnostics = Diagnostics::new();
        for (axis, used) in Axis::ALL.into_iter().zip(self.override_structures_used()) {
            if used && !self.axis(axis).is_auto() {
                diagnostics.warn(
                    Some(axis),
                    WarningKind::OverrideIgnored,
                    format!(
                        "override structures take no effect along {axis}; \
                         use an automatic grid on this axis to apply them"
                    ),
                );
            }
        }

        let structures: Vec<Structure> = request
            .structures
            .iter()
            .chain(&self.override_structures)
            .cloned()
            .collect();

        let per_axis: Vec<Result<(Coords1D, Diagnostics)>> = Axis::ALL
            .par_iter()
            .map(|&axis| {
                let inputs = AxisInputs {
                    structures: &structures,
                    symmetry: request.symmetry,
                    periodic: request.periodic[axis.index()],
                    wavelength,
                    num_pml_layers: request.num_pml_layers[axis.index()],
                    snapping_points: &self.snapping_points,
                };
                let mut axis_diagnostics = Diagnostics::new();
                let coords = self.axis(axis).make_coords(axis, &inputs, &mut axis_diagnostics)?;
                Ok((coords, axis_diagnostics))
            })
            .collect();

        let mut axes = Vec::with_capacity(3);
        for result in per_axis {
            let (coords, axis_diagnostics) = result?;
            diagnostics.extend(axis_diagnostics);
            axes.push(coords);
        }
        let [x, y, z]: [Coords1D; 3] = axes
            .try_into()
            .map_err(|_| GridError::config("expected boundaries for exactly three axes"))?;

        let grid = Grid { x, y, z };
        tracing::debug!(cells = ?grid.num_cells(), warnings = diagnostics.warnings().len(), "grid built");
        Ok(MeshOutput { grid, diagnostics })
    }
}

/// A grid specification and the simulation it applies to, as read from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridJob {
    #[serde(default)]
    pub spec: GridSpec,
    pub request: MeshRequest,
}

impl GridJob {
    pub fn run(&self) -> Result<MeshOutput> {
        self.spec.make_grid(&self.request)
    }
}
