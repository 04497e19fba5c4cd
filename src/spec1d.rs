//! Grid specification along a single axis.
//!
//! Every strategy first produces raw boundaries covering the simulation
//! domain; symmetry folding and absorber padding are applied on top of that
//! in [`GridSpec1d::make_coords`].

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::error::{GridError, Result};
use crate::geometry::{Axis, BoxGeometry, SnapPoint, Structure, Symmetry};
use crate::grid::Coords1D;
use crate::mesher::{
    insert_snapping_points, make_grid_multiple_intervals, mandatory_coords, parse_structures,
    OverlapPolicy,
};

/// Relative tolerance of [`isclose`]
const RTOL: f64 = 1e-5;
/// Absolute tolerance of [`isclose`]
const ATOL: f64 = 1e-8;

/// `numpy.isclose` with its default tolerances
pub(crate) fn isclose(a: f64, b: f64) -> bool {
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

/// Settings of the automatic non-uniform grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoGrid {
    /// Minimal number of steps per wavelength in each medium (>= 6)
    pub min_steps_per_wvl: f64,
    /// Largest ratio between two consecutive steps, in [1.2, 2)
    pub max_scale: f64,
    /// Soft lower bound on the step size, applied even to enforced overrides
    pub dl_min: f64,
    /// Snapping points closer than this fraction of the local step to an
    /// existing boundary are dropped
    pub snap_tolerance: f64,
    /// Step selection where structures overlap
    pub overlap: OverlapPolicy,
}

impl Default for AutoGrid {
    fn default() -> Self {
        Self {
            min_steps_per_wvl: 10.0,
            max_scale: 1.4,
            dl_min: 0.0,
            snap_tolerance: 1e-3,
            overlap: OverlapPolicy::Finest,
        }
    }
}

impl AutoGrid {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_steps_per_wvl >= 6.0) {
            return Err(GridError::config(format!(
                "min_steps_per_wvl must be at least 6, got {}",
                self.min_steps_per_wvl
            )));
        }
        if !(self.max_scale >= 1.2 && self.max_scale < 2.0) {
            return Err(GridError::config(format!(
                "max_scale must lie in [1.2, 2.0), got {}",
                self.max_scale
            )));
        }
        if !(self.dl_min >= 0.0) {
            return Err(GridError::config(format!(
                "dl_min must be non-negative, got {}",
                self.dl_min
            )));
        }
        if !(self.snap_tolerance >= 0.0 && self.snap_tolerance < 0.5) {
            return Err(GridError::config(format!(
                "snap_tolerance must lie in [0, 0.5), got {}",
                self.snap_tolerance
            )));
        }
        Ok(())
    }
}

/// How boundaries along one axis are generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridSpec1d {
    /// Constant step, shrunk slightly so the domain holds a whole number of cells
    Uniform { dl: f64 },
    /// Explicit boundary coordinates
    CustomBoundaries { coords: Vec<f64> },
    /// Explicit step sizes, centered on the domain or starting at `custom_offset`.
    /// The first and last step are repeated if they do not cover the domain.
    Custom {
        dl: Vec<f64>,
        #[serde(default)]
        custom_offset: Option<f64>,
    },
    /// Non-uniform grid following the structures
    Auto(AutoGrid),
}

impl Default for GridSpec1d {
    fn default() -> Self {
        GridSpec1d::Auto(AutoGrid::default())
    }
}

/// Everything an axis strategy may consult
#[derive(Debug, Clone, Copy)]
pub struct AxisInputs<'a> {
    /// Simulation domain with the background medium first, then the
    /// structures and override structures
    pub structures: &'a [Structure],
    pub symmetry: [Symmetry; 3],
    pub periodic: bool,
    /// Free-space wavelength (µm); required by the auto strategy only
    pub wavelength: Option<f64>,
    /// Absorber cells on the low and high side
    pub num_pml_layers: (usize, usize),
    pub snapping_points: &'a [SnapPoint],
}

impl GridSpec1d {
    pub fn is_auto(&self) -> bool {
        matches!(self, GridSpec1d::Auto(_))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, GridSpec1d::Custom { .. })
    }

    /// Final boundaries along `axis`, including the absorber cells
    pub fn make_coords(
        &self,
        axis: Axis,
        inputs: &AxisInputs<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Coords1D> {
        let domain = inputs
            .structures
            .first()
            .ok_or_else(|| GridError::config("structure list must start with the simulation domain"))?
            .geometry;
        let symmetry = inputs.symmetry[axis.index()];
        let is_periodic = inputs.periodic && symmetry == 0;

        let mut coords = match self {
            GridSpec1d::Uniform { dl } => uniform_coords(axis, &domain, *dl)?,
            GridSpec1d::CustomBoundaries { coords } => {
                custom_boundaries_coords(axis, &domain, coords)?
            }
            GridSpec1d::Custom { dl, custom_offset } => {
                custom_coords(axis, &domain, dl, *custom_offset)?
            }
            GridSpec1d::Auto(auto) => auto_coords(auto, axis, inputs, is_periodic, diagnostics)?,
        };

        if symmetry != 0 {
            coords = fold_symmetric(axis, domain.center[axis.index()], &coords)?;
        }
        let coords = add_pml_to_bounds(inputs.num_pml_layers, coords);

        tracing::debug!(
            %axis,
            cells = coords.len().saturating_sub(1),
            symmetric = symmetry != 0,
            periodic = is_periodic,
            "axis coordinates generated"
        );
        self.checked_coords(axis, coords)
    }

    /// Broken auto output is a mesher defect, anything else traces back to
    /// the user's parameters.
    fn checked_coords(&self, axis: Axis, coords: Vec<f64>) -> Result<Coords1D> {
        Coords1D::try_from(coords).map_err(|reason| {
            let detail = format!("generated boundaries along {axis} are invalid: {reason}");
            if self.is_auto() {
                GridError::internal(axis, detail)
            } else {
                GridError::config(detail)
            }
        })
    }

    /// Parameter checks that need no simulation inputs
    pub fn validate(&self, axis: Axis) -> Result<()> {
        match self {
            GridSpec1d::Uniform { dl } => check_uniform_step(axis, *dl),
            GridSpec1d::CustomBoundaries { coords } => check_boundaries(axis, coords),
            GridSpec1d::Custom { dl, .. } => check_custom_steps(axis, dl),
            GridSpec1d::Auto(auto) => auto.validate(),
        }
    }
}

fn check_uniform_step(axis: Axis, dl: f64) -> Result<()> {
    if !(dl > 0.0) {
        return Err(GridError::config(format!(
            "uniform step along {axis} must be positive, got {dl}"
        )));
    }
    Ok(())
}

fn check_boundaries(axis: Axis, coords: &[f64]) -> Result<()> {
    if coords.len() < 2 || !coords.windows(2).all(|w| w[0] < w[1]) {
        return Err(GridError::config(format!(
            "custom boundaries along {axis} must hold at least two strictly increasing values"
        )));
    }
    Ok(())
}

fn check_custom_steps(axis: Axis, dl: &[f64]) -> Result<()> {
    if dl.is_empty() || dl.iter().any(|d| !(*d > 0.0)) {
        return Err(GridError::config(format!(
            "custom steps along {axis} must be a non-empty list of positive values"
        )));
    }
    Ok(())
}

fn uniform_coords(axis: Axis, domain: &BoxGeometry, dl: f64) -> Result<Vec<f64>> {
    check_uniform_step(axis, dl)?;
    let (lo, _) = domain.axis_bounds(axis);
    let size = domain.size[axis.index()];
    let num_cells = ((size / dl).ceil() as usize).max(1);
    let step = size / num_cells as f64;
    // an extent below the resolution of `lo` is treated as zero-size
    let step = if lo + step > lo { step } else { dl };
    Ok((0..=num_cells).map(|i| lo + i as f64 * step).collect())
}

fn custom_boundaries_coords(axis: Axis, domain: &BoxGeometry, coords: &[f64]) -> Result<Vec<f64>> {
    check_boundaries(axis, coords)?;
    postprocess_unaligned_grid(axis, domain, false, coords)
}

fn custom_coords(
    axis: Axis,
    domain: &BoxGeometry,
    dl: &[f64],
    custom_offset: Option<f64>,
) -> Result<Vec<f64>> {
    check_custom_steps(axis, dl)?;
    let mut coords = Vec::with_capacity(dl.len() + 1);
    let mut x = 0.0;
    coords.push(x);
    for d in dl {
        x += d;
        coords.push(x);
    }
    let shift = match custom_offset {
        Some(offset) => offset,
        None => domain.center[axis.index()] - x / 2.0,
    };
    for c in &mut coords {
        *c += shift;
    }
    postprocess_unaligned_grid(axis, domain, custom_offset.is_some(), &coords)
}

fn auto_coords(
    auto: &AutoGrid,
    axis: Axis,
    inputs: &AxisInputs<'_>,
    is_periodic: bool,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<f64>> {
    auto.validate()?;
    let wavelength = inputs.wavelength.ok_or_else(|| {
        GridError::config(format!(
            "automatic grid along {axis} requires a wavelength or at least one source"
        ))
    })?;
    let (background, rest) = inputs
        .structures
        .split_first()
        .ok_or_else(|| GridError::config("structure list must start with the simulation domain"))?;

    // mesh only the positive half of every symmetric dimension
    let mut half = background.geometry;
    for (dim, sym) in inputs.symmetry.iter().enumerate() {
        if *sym != 0 {
            half.center[dim] += half.size[dim] / 4.0;
            half.size[dim] /= 2.0;
        }
    }
    let mut structures = Vec::with_capacity(inputs.structures.len());
    structures.push(Structure {
        geometry: half,
        ..background.clone()
    });
    structures.extend(rest.iter().filter(|s| half.intersects(&s.geometry)).cloned());

    let intervals = parse_structures(
        axis,
        &structures,
        wavelength,
        auto.min_steps_per_wvl,
        auto.dl_min,
        auto.overlap,
    )?;
    let mandatory = mandatory_coords(axis, inputs.snapping_points, &structures[1..]);
    let intervals =
        insert_snapping_points(axis, intervals, &mandatory, auto.snap_tolerance, diagnostics);

    // zero-size axis: a single cell
    if intervals.is_degenerate() {
        let dl = wavelength / auto.min_steps_per_wvl;
        let c = half.center[axis.index()];
        return Ok(vec![c - dl / 2.0, c + dl / 2.0]);
    }

    let lengths = intervals.lengths();
    let steps = make_grid_multiple_intervals(
        axis,
        intervals.max_steps(),
        &lengths,
        auto.max_scale,
        is_periodic,
    )?;

    assemble_graded(axis, intervals.coords(), &steps)
}

/// Lay the synthesized steps out from the first edge and pin every interval
/// to its exact edge. Fails when the laid-out boundary at any edge, including
/// the last one, drifts from that edge.
fn assemble_graded(axis: Axis, edges: &[f64], steps: &[Vec<f64>]) -> Result<Vec<f64>> {
    if edges.len() != steps.len() + 1 || steps.iter().any(Vec::is_empty) {
        return Err(GridError::internal(
            axis,
            format!("{} step lists for {} interval edges", steps.len(), edges.len()),
        ));
    }

    let mut coords = Vec::with_capacity(steps.iter().map(Vec::len).sum::<usize>() + 1);
    let mut laid_out = edges[0];
    for (k, interval) in steps.iter().enumerate() {
        let mut x = edges[k];
        coords.push(x);
        for step in &interval[..interval.len() - 1] {
            x += step;
            coords.push(x);
        }
        laid_out += interval.iter().sum::<f64>();
        let edge = edges[k + 1];
        if !isclose(laid_out, edge) {
            return Err(GridError::internal(
                axis,
                format!(
                    "graded boundaries span [{}, {laid_out}] but interval {k} ends at {edge}",
                    edges[0]
                ),
            ));
        }
    }
    coords.push(edges[edges.len() - 1]);
    Ok(coords)
}

/// Mirror boundaries about `center`.
///
/// The boundary closest to `center` is moved onto it, everything below is
/// discarded and the upper half is reflected, so `center` appears once.
pub fn fold_symmetric(axis: Axis, center: f64, coords: &[f64]) -> Result<Vec<f64>> {
    if coords.is_empty() {
        return Err(GridError::config(format!("no boundaries to fold along {axis}")));
    }
    let nearest = coords
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, best_dist), (i, c)| {
            let dist = (c - center).abs();
            if dist < best_dist {
                (i, dist)
            } else {
                (best, best_dist)
            }
        })
        .0;
    let shift = center - coords[nearest];
    let mut upper: Vec<f64> = coords[nearest..].iter().map(|c| c + shift).collect();
    upper[0] = center;
    if upper.len() < 2 {
        return Err(GridError::config(format!(
            "no boundaries above the symmetry plane along {axis}"
        )));
    }

    let mut folded = Vec::with_capacity(2 * upper.len() - 1);
    folded.extend(upper[1..].iter().rev().map(|c| 2.0 * center - c));
    folded.extend(upper);
    Ok(folded)
}

/// Extend `bounds` by absorber cells of the first and last step size
pub fn add_pml_to_bounds(num_layers: (usize, usize), bounds: Vec<f64>) -> Vec<f64> {
    if bounds.len() < 2 {
        return bounds;
    }
    let first_step = bounds[1] - bounds[0];
    let last_step = bounds[bounds.len() - 1] - bounds[bounds.len() - 2];
    let first = bounds[0];
    let last = bounds[bounds.len() - 1];

    let mut padded = Vec::with_capacity(bounds.len() + num_layers.0 + num_layers.1);
    padded.extend((1..=num_layers.0).rev().map(|i| first - first_step * i as f64));
    padded.extend(bounds);
    padded.extend((1..=num_layers.1).map(|i| last + last_step * i as f64));
    padded
}

/// One single-precision ulp beyond `x`, in the direction given by `up`
fn widen_f32(x: f64, up: bool) -> f64 {
    let v = x as f32;
    if !v.is_finite() {
        return v as f64;
    }
    let bits = v.to_bits();
    let next = if v == 0.0 {
        if up {
            1
        } else {
            0x8000_0001
        }
    } else if (v > 0.0) == up {
        bits + 1
    } else {
        bits - 1
    };
    f32::from_bits(next) as f64
}

/// Fit user supplied boundaries to the simulation domain.
///
/// Boundaries outside the domain (widened by one f32 ulp) are dropped and the
/// first/last step is repeated until the domain is covered. With
/// `machine_error_relaxation`, one more boundary is added at either end when
/// it lands numerically on the domain edge. A zero-size domain yields the
/// cell containing its center.
pub fn postprocess_unaligned_grid(
    axis: Axis,
    domain: &BoxGeometry,
    machine_error_relaxation: bool,
    coords: &[f64],
) -> Result<Vec<f64>> {
    let i = axis.index();
    let (center, size) = (domain.center[i], domain.size[i]);
    let bound_min = widen_f32(center - size / 2.0, false);
    let bound_max = widen_f32(center + size / 2.0, true);

    if coords.len() < 2 {
        return Err(GridError::config(format!(
            "need at least two boundaries along {axis}, got {}",
            coords.len()
        )));
    }
    if bound_max < coords[0] || bound_min > coords[coords.len() - 1] {
        return Err(GridError::DomainMismatch { axis });
    }

    if size == 0.0 {
        let ind = coords
            .partition_point(|&c| c <= center)
            .clamp(1, coords.len() - 1);
        return Ok(coords[ind - 1..=ind].to_vec());
    }

    let mut band: Vec<f64> = coords
        .iter()
        .copied()
        .filter(|&c| c >= bound_min && c <= bound_max)
        .collect();
    if band.len() < 2 {
        return Err(GridError::DomainMismatch { axis });
    }

    let dl_first = band[1] - band[0];
    let dl_last = band[band.len() - 1] - band[band.len() - 2];
    let mut front = Vec::new();
    let mut x = band[0];
    while x - dl_first >= bound_min {
        x -= dl_first;
        front.push(x);
    }
    let mut x = band[band.len() - 1];
    while x + dl_last <= bound_max {
        x += dl_last;
        band.push(x);
    }

    if machine_error_relaxation {
        let low = front.last().copied().unwrap_or(band[0]) - dl_first;
        if isclose(low, bound_min) {
            front.push(low);
        }
        let high = band[band.len() - 1] + dl_last;
        if isclose(high, bound_max) {
            band.push(high);
        }
    }

    front.reverse();
    front.extend(band);
    Ok(front)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::Medium;

    const TOL: f64 = 1e-9;

    fn domain(center: [f64; 3], size: [f64; 3]) -> Structure {
        Structure::new("domain", BoxGeometry::new(center, size), Medium::air())
    }

    fn inputs<'a>(structures: &'a [Structure], symmetry: [Symmetry; 3]) -> AxisInputs<'a> {
        AxisInputs {
            structures,
            symmetry,
            periodic: false,
            wavelength: Some(1.0),
            num_pml_layers: (0, 0),
            snapping_points: &[],
        }
    }

    fn make(spec: &GridSpec1d, axis: Axis, inputs: &AxisInputs<'_>) -> Result<Vec<f64>> {
        let mut diag = Diagnostics::new();
        spec.make_coords(axis, inputs, &mut diag)
            .map(|c| c.as_slice().to_vec())
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < TOL, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_uniform_tenth() {
        let structures = [domain([0.0; 3], [1.0; 3])];
        let coords = make(&GridSpec1d::Uniform { dl: 0.1 }, Axis::X, &inputs(&structures, [0; 3]))
            .unwrap();
        let expected: Vec<f64> = (0..=10).map(|i| -0.5 + 0.1 * i as f64).collect();
        assert_close(&coords, &expected);
    }

    #[test]
    fn test_uniform_shrinks_step_to_fit() {
        let structures = [domain([0.0; 3], [1.0; 3])];
        let coords = make(&GridSpec1d::Uniform { dl: 0.3 }, Axis::Y, &inputs(&structures, [0; 3]))
            .unwrap();
        assert_close(&coords, &[-0.5, -0.25, 0.0, 0.25, 0.5]);
    }

    #[test]
    fn test_uniform_zero_size_axis() {
        let structures = [domain([0.0, 0.0, 2.0], [1.0, 1.0, 0.0])];
        let coords = make(&GridSpec1d::Uniform { dl: 0.1 }, Axis::Z, &inputs(&structures, [0; 3]))
            .unwrap();
        assert_close(&coords, &[2.0, 2.1]);
    }

    #[test]
    fn test_rejects_non_positive_uniform_step() {
        let structures = [domain([0.0; 3], [1.0; 3])];
        let err = make(&GridSpec1d::Uniform { dl: 0.0 }, Axis::X, &inputs(&structures, [0; 3]))
            .unwrap_err();
        assert!(matches!(err, GridError::Configuration(_)));
    }

    #[test]
    fn test_uniform_extent_below_resolution() {
        let structures = [domain([1.0; 3], [1.0, 1.0, 1e-17])];
        let coords = make(&GridSpec1d::Uniform { dl: 0.1 }, Axis::Z, &inputs(&structures, [0; 3]))
            .unwrap();
        assert_close(&coords, &[1.0, 1.1]);
        assert!(coords[0] < coords[1]);
    }

    #[test]
    fn test_collapsed_output_is_an_error() {
        let collapsed = vec![1.0, 1.0];
        let err = GridSpec1d::Uniform { dl: 0.1 }
            .checked_coords(Axis::Z, collapsed.clone())
            .unwrap_err();
        assert!(matches!(err, GridError::Configuration(_)));
        let err = GridSpec1d::default().checked_coords(Axis::Z, collapsed).unwrap_err();
        assert!(matches!(err, GridError::InternalConsistency { axis: Axis::Z, .. }));
    }

    #[test]
    fn test_validate_without_inputs() {
        assert!(GridSpec1d::Uniform { dl: 0.1 }.validate(Axis::X).is_ok());
        assert!(GridSpec1d::default().validate(Axis::X).is_ok());
        let bad = [
            GridSpec1d::Uniform { dl: -0.1 },
            GridSpec1d::CustomBoundaries { coords: vec![0.0, 0.0] },
            GridSpec1d::Custom { dl: vec![], custom_offset: None },
            GridSpec1d::Auto(AutoGrid { max_scale: 2.0, ..AutoGrid::default() }),
        ];
        for spec in bad {
            assert!(matches!(spec.validate(Axis::Y), Err(GridError::Configuration(_))), "{spec:?}");
        }
    }

    #[test]
    fn test_graded_assembly_pins_edges() {
        let edges = [0.0, 0.5, 1.25];
        let steps = vec![vec![0.25, 0.25], vec![0.25, 0.5]];
        let coords = assemble_graded(Axis::X, &edges, &steps).unwrap();
        assert_eq!(coords, vec![0.0, 0.25, 0.5, 0.75, 1.25]);
    }

    #[test]
    fn test_graded_assembly_detects_drift() {
        let edges = [0.0, 0.5, 1.25];
        // second interval falls short of the domain end
        let short = vec![vec![0.25, 0.25], vec![0.25, 0.25]];
        let err = assemble_graded(Axis::X, &edges, &short).unwrap_err();
        assert!(matches!(err, GridError::InternalConsistency { axis: Axis::X, .. }));
        // first interval overshoots its edge, last one compensates
        let shifted = vec![vec![0.5, 0.25], vec![0.5]];
        let err = assemble_graded(Axis::X, &edges, &shifted).unwrap_err();
        assert!(matches!(err, GridError::InternalConsistency { .. }));
        let missing = vec![vec![0.5]];
        assert!(assemble_graded(Axis::X, &edges, &missing).is_err());
    }

    #[test]
    fn test_pml_padding() {
        let padded = add_pml_to_bounds((2, 3), vec![0.0, 0.2, 0.4, 0.6, 0.8]);
        assert_eq!(padded.len(), 10);
        assert_close(&padded, &[-0.4, -0.2, 0.0, 0.2, 0.4, 0.6, 0.8, 1.0, 1.2, 1.4]);
        assert_eq!(add_pml_to_bounds((4, 4), vec![1.0]), vec![1.0]);
    }

    #[test]
    fn test_pml_uses_edge_steps() {
        let structures = [domain([0.0; 3], [1.0; 3])];
        let mut axis_inputs = inputs(&structures, [0; 3]);
        axis_inputs.num_pml_layers = (1, 2);
        let spec = GridSpec1d::CustomBoundaries {
            coords: vec![-0.5, -0.25, 0.5],
        };
        let coords = make(&spec, Axis::X, &axis_inputs).unwrap();
        assert_close(&coords, &[-0.75, -0.5, -0.25, 0.5, 1.25, 2.0]);
    }

    #[test]
    fn test_fold_symmetric() {
        let folded = fold_symmetric(Axis::X, 0.0, &[-1.0, -0.1, 0.4, 1.0]).unwrap();
        assert_close(&folded, &[-1.1, -0.5, 0.0, 0.5, 1.1]);
        for (a, b) in folded.iter().zip(folded.iter().rev()) {
            assert_eq!(*a, -*b);
        }
    }

    #[test]
    fn test_fold_needs_upper_half() {
        assert!(fold_symmetric(Axis::Y, 5.0, &[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_symmetric_uniform_axis() {
        let structures = [domain([1.0, 0.0, 0.0], [2.0, 1.0, 1.0])];
        let coords = make(
            &GridSpec1d::Uniform { dl: 0.3 },
            Axis::X,
            &inputs(&structures, [1, 0, 0]),
        )
        .unwrap();
        assert!(coords.contains(&1.0));
        for (a, b) in coords.iter().zip(coords.iter().rev()) {
            assert!((a - 1.0 + (b - 1.0)).abs() < TOL);
        }
    }

    #[test]
    fn test_custom_boundaries_are_trimmed_and_extended() {
        let structures = [domain([0.0; 3], [2.0; 3])];
        let spec = GridSpec1d::CustomBoundaries {
            coords: vec![-3.0, -0.5, 0.0, 0.5],
        };
        let coords = make(&spec, Axis::X, &inputs(&structures, [0; 3])).unwrap();
        assert_close(&coords, &[-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_custom_boundaries_outside_domain() {
        let structures = [domain([0.0; 3], [2.0; 3])];
        let spec = GridSpec1d::CustomBoundaries {
            coords: vec![5.0, 6.0, 7.0],
        };
        let err = make(&spec, Axis::Y, &inputs(&structures, [0; 3])).unwrap_err();
        assert!(matches!(err, GridError::DomainMismatch { axis: Axis::Y }));
    }

    #[test]
    fn test_custom_boundaries_must_increase() {
        let structures = [domain([0.0; 3], [2.0; 3])];
        let spec = GridSpec1d::CustomBoundaries {
            coords: vec![0.0, 0.5, 0.5],
        };
        let err = make(&spec, Axis::Z, &inputs(&structures, [0; 3])).unwrap_err();
        assert!(matches!(err, GridError::Configuration(_)));
    }

    #[test]
    fn test_zero_size_domain_takes_bracketing_cell() {
        let structures = [domain([0.0, 0.25, 0.0], [1.0, 0.0, 1.0])];
        let spec = GridSpec1d::CustomBoundaries {
            coords: vec![0.0, 0.5, 1.0],
        };
        let coords = make(&spec, Axis::Y, &inputs(&structures, [0; 3])).unwrap();
        assert_eq!(coords, vec![0.0, 0.5]);

        // center on the last boundary
        let structures = [domain([0.0, 1.0, 0.0], [1.0, 0.0, 1.0])];
        let coords = make(&spec, Axis::Y, &inputs(&structures, [0; 3])).unwrap();
        assert_eq!(coords, vec![0.5, 1.0]);
    }

    #[test]
    fn test_custom_steps_centered() {
        let structures = [domain([0.0; 3], [1.0; 3])];
        let spec = GridSpec1d::Custom {
            dl: vec![0.25, 0.5, 0.25],
            custom_offset: None,
        };
        let coords = make(&spec, Axis::X, &inputs(&structures, [0; 3])).unwrap();
        assert_close(&coords, &[-0.5, -0.25, 0.25, 0.5]);
    }

    #[test]
    fn test_custom_offset_relaxes_machine_error() {
        let structures = [domain([0.0; 3], [1.0; 3])];
        let offset = -0.500_001;
        let spec = GridSpec1d::Custom {
            dl: vec![0.1; 10],
            custom_offset: Some(offset),
        };
        let relaxed = make(&spec, Axis::X, &inputs(&structures, [0; 3])).unwrap();
        assert_eq!(relaxed.len(), 11);
        assert!((relaxed[0] - offset).abs() < TOL);

        let strict = GridSpec1d::CustomBoundaries {
            coords: (0..=10).map(|i| offset + 0.1 * i as f64).collect(),
        };
        let chopped = make(&strict, Axis::X, &inputs(&structures, [0; 3])).unwrap();
        assert_eq!(chopped.len(), 10);
        assert!(chopped[0] > -0.41);
    }

    #[test]
    fn test_widen_f32() {
        assert!(widen_f32(0.5, true) > 0.5);
        assert!(widen_f32(0.5, false) < 0.5);
        assert!(widen_f32(-0.5, false) < -0.5);
        assert!(widen_f32(0.0, false) < 0.0);
        assert!(widen_f32(0.5, true) - 0.5 < 1e-7);
    }

    fn slab_scene() -> Vec<Structure> {
        vec![
            domain([0.0; 3], [2.0; 3]),
            Structure::new(
                "slab",
                BoxGeometry::new([0.0; 3], [0.5, 4.0, 4.0]),
                Medium::dielectric(4.0),
            ),
        ]
    }

    #[test]
    fn test_auto_follows_structures() {
        let structures = slab_scene();
        let coords = make(&GridSpec1d::default(), Axis::X, &inputs(&structures, [0; 3])).unwrap();
        assert_eq!(coords[0], -1.0);
        assert_eq!(coords[coords.len() - 1], 1.0);
        assert!(coords.contains(&-0.25));
        assert!(coords.contains(&0.25));

        let grid = Coords1D::try_from(coords.clone()).unwrap();
        assert!(grid.max_step_ratio() <= 1.4 * (1.0 + TOL));
        for (c, step) in grid.centers().iter().zip(grid.steps()) {
            let ceiling = if c.abs() < 0.25 { 0.05 } else { 0.1 };
            assert!(step <= ceiling * (1.0 + TOL), "step {step} at {c}");
        }
    }

    #[test]
    fn test_auto_symmetric() {
        let structures = slab_scene();
        let coords = make(&GridSpec1d::default(), Axis::X, &inputs(&structures, [-1, 0, 0])).unwrap();
        assert!(coords.contains(&0.0));
        assert_eq!(coords[0], -1.0);
        for (a, b) in coords.iter().zip(coords.iter().rev()) {
            assert_eq!(*a, -*b);
        }
    }

    #[test]
    fn test_auto_periodic_wrap() {
        let structures = vec![
            domain([0.0; 3], [2.0; 3]),
            Structure::new(
                "edge",
                BoxGeometry::new([-0.9, 0.0, 0.0], [0.2, 4.0, 4.0]),
                Medium::dielectric(16.0),
            ),
        ];
        let mut axis_inputs = inputs(&structures, [0; 3]);
        axis_inputs.periodic = true;
        let coords = make(&GridSpec1d::default(), Axis::X, &axis_inputs).unwrap();
        let steps = Coords1D::try_from(coords).unwrap().steps();
        let (first, last) = (steps[0], steps[steps.len() - 1]);
        assert!((first / last).max(last / first) <= 1.4 * (1.0 + TOL));
    }

    #[test]
    fn test_auto_zero_size_axis() {
        let structures = [domain([0.0, 0.0, 0.3], [2.0, 2.0, 0.0])];
        let coords = make(&GridSpec1d::default(), Axis::Z, &inputs(&structures, [0; 3])).unwrap();
        assert_close(&coords, &[0.25, 0.35]);
    }

    #[test]
    fn test_auto_snaps_to_points() {
        let structures = [domain([0.0; 3], [2.0; 3])];
        let points = [[Some(0.123), None, None]];
        let mut axis_inputs = inputs(&structures, [0; 3]);
        axis_inputs.snapping_points = &points;
        let x = make(&GridSpec1d::default(), Axis::X, &axis_inputs).unwrap();
        assert_eq!(x.iter().filter(|c| **c == 0.123).count(), 1);
    }

    #[test]
    fn test_auto_requires_wavelength() {
        let structures = slab_scene();
        let mut axis_inputs = inputs(&structures, [0; 3]);
        axis_inputs.wavelength = None;
        let err = make(&GridSpec1d::default(), Axis::X, &axis_inputs).unwrap_err();
        assert!(matches!(err, GridError::Configuration(_)));
    }

    #[test]
    fn test_auto_validation() {
        let bad = [
            AutoGrid { max_scale: 2.0, ..AutoGrid::default() },
            AutoGrid { max_scale: 1.1, ..AutoGrid::default() },
            AutoGrid { min_steps_per_wvl: 5.0, ..AutoGrid::default() },
            AutoGrid { dl_min: -1.0, ..AutoGrid::default() },
        ];
        for auto in bad {
            assert!(auto.validate().is_err(), "{auto:?}");
        }
        assert!(AutoGrid::default().validate().is_ok());
    }

    #[test]
    fn test_parse_axis_spec() {
        let spec: GridSpec1d = serde_json::from_str(r#"{"type": "auto", "max_scale": 1.3}"#).unwrap();
        assert_eq!(
            spec,
            GridSpec1d::Auto(AutoGrid {
                max_scale: 1.3,
                ..AutoGrid::default()
            })
        );
        let spec: GridSpec1d =
            serde_json::from_str(r#"{"type": "custom", "dl": [0.1, 0.2]}"#).unwrap();
        assert!(spec.is_custom());
    }
}
