//! Splitting an axis into intervals of constant step ceiling

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, WarningKind};
use crate::error::{GridError, Result};
use crate::geometry::{Axis, BoxGeometry, Resolution, SnapPoint, Structure};

/// Edges closer than this fraction of the domain size are merged
const EDGE_MERGE_RTOL: f64 = 1e-10;

/// How the ceiling is chosen where structures overlap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Structures completely covered by a later structure are ignored; among
    /// the rest the finest step wins.
    #[default]
    Finest,
    /// The structure added last decides.
    Topmost,
}

/// Contiguous intervals covering the domain along one axis.
///
/// `coords` holds the `n + 1` interval edges and `max_steps` the `n`
/// ceilings. A set with a single coordinate marks a zero-size axis.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSet {
    coords: Vec<f64>,
    max_steps: Vec<f64>,
}

impl IntervalSet {
    pub(crate) fn new(coords: Vec<f64>, max_steps: Vec<f64>) -> Self {
        debug_assert_eq!(coords.len(), max_steps.len() + 1);
        Self { coords, max_steps }
    }

    fn degenerate(center: f64) -> Self {
        Self {
            coords: vec![center],
            max_steps: Vec::new(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.max_steps.is_empty()
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub fn max_steps(&self) -> &[f64] {
        &self.max_steps
    }

    pub fn len(&self) -> usize {
        self.max_steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_steps.is_empty()
    }

    pub fn lengths(&self) -> Vec<f64> {
        self.coords.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

struct Candidate {
    clipped: BoxGeometry,
    lo: f64,
    hi: f64,
    max_step: f64,
    enforced: bool,
    visible: bool,
}

impl Candidate {
    fn covers(&self, x: f64) -> bool {
        self.lo <= x && x <= self.hi
    }
}

/// Intervals and ceilings from the structures along `axis`.
///
/// `structures[0]` is the simulation domain carrying the background medium.
pub fn parse_structures(
    axis: Axis,
    structures: &[Structure],
    wavelength: f64,
    min_steps_per_wvl: f64,
    dl_min: f64,
    policy: OverlapPolicy,
) -> Result<IntervalSet> {
    let background = structures
        .first()
        .ok_or_else(|| GridError::config("structure list must start with the simulation domain"))?;
    let domain = background.geometry;
    let (domain_min, domain_max) = domain.axis_bounds(axis);
    if domain_max - domain_min <= 0.0 {
        return Ok(IntervalSet::degenerate(domain.center[axis.index()]));
    }

    let mut candidates = Vec::with_capacity(structures.len());
    for (i, structure) in structures.iter().enumerate() {
        let clipped = if i == 0 {
            domain
        } else {
            match structure.geometry.clipped_to(&domain) {
                Some(clipped) => clipped,
                None => continue,
            }
        };
        let Some(max_step) = structure.max_step(axis, wavelength, min_steps_per_wvl) else {
            if i == 0 {
                return Err(GridError::config(
                    "the simulation domain must carry a background medium",
                ));
            }
            continue;
        };
        if max_step.is_nan() || max_step <= 0.0 {
            return Err(GridError::config(format!(
                "structure '{}' gives a non-positive step {max_step} along {axis}",
                structure.name
            )));
        }
        let (lo, hi) = clipped.axis_bounds(axis);
        candidates.push(Candidate {
            clipped,
            lo,
            hi,
            max_step,
            enforced: structure.is_enforced(),
            visible: true,
        });
    }

    for i in 0..candidates.len() {
        let hidden = candidates[i + 1..]
            .iter()
            .any(|later| later.clipped.contains(&candidates[i].clipped));
        candidates[i].visible = !hidden;
    }

    let tol = EDGE_MERGE_RTOL * (domain_max - domain_min);
    let mut edges: Vec<f64> = candidates
        .iter()
        .filter(|c| c.visible || c.enforced)
        .flat_map(|c| [c.lo, c.hi])
        .filter(|&e| e > domain_min + tol && e < domain_max - tol)
        .collect();
    edges.sort_by(f64::total_cmp);

    let mut coords = vec![domain_min];
    for e in edges {
        if e - coords[coords.len() - 1] > tol {
            coords.push(e);
        }
    }
    coords.push(domain_max);

    let max_steps = coords
        .windows(2)
        .map(|w| {
            let mid = (w[0] + w[1]) / 2.0;
            let step = interval_step(&candidates, mid, policy);
            step.max(dl_min)
        })
        .collect::<Vec<_>>();

    tracing::debug!(%axis, intervals = max_steps.len(), "parsed structures");
    Ok(IntervalSet::new(coords, max_steps))
}

fn interval_step(candidates: &[Candidate], x: f64, policy: OverlapPolicy) -> f64 {
    if let Some(enforced) = candidates.iter().rev().find(|c| c.enforced && c.covers(x)) {
        return enforced.max_step;
    }
    match policy {
        OverlapPolicy::Finest => candidates
            .iter()
            .filter(|c| c.visible && c.covers(x))
            .map(|c| c.max_step)
            .fold(f64::INFINITY, f64::min),
        // the background covers every point, so there is always a match
        OverlapPolicy::Topmost => candidates
            .iter()
            .rev()
            .find(|c| c.covers(x))
            .map_or(candidates[0].max_step, |c| c.max_step),
    }
}

/// Coordinates along `axis` that must become grid boundaries: snapping
/// points plus the edges of override structures acting on this axis.
pub fn mandatory_coords(axis: Axis, snapping_points: &[SnapPoint], structures: &[Structure]) -> Vec<f64> {
    let snaps = snapping_points.iter().filter_map(|p| p[axis.index()]);
    let overrides = structures
        .iter()
        .filter(|s| matches!(s.resolution, Resolution::Override { .. }) && s.acts_on(axis))
        .flat_map(|s| {
            let (lo, hi) = s.geometry.axis_bounds(axis);
            [lo, hi]
        });
    snaps.chain(overrides).collect()
}

/// Split intervals so every coordinate strictly inside the domain becomes an
/// interval edge. Points within `tolerance * max_step` of an existing edge are
/// dropped; exact hits are dropped silently.
pub fn insert_snapping_points(
    axis: Axis,
    mut intervals: IntervalSet,
    points: &[f64],
    tolerance: f64,
    diagnostics: &mut Diagnostics,
) -> IntervalSet {
    if intervals.is_degenerate() {
        return intervals;
    }
    let lo = intervals.coords[0];
    let hi = intervals.coords[intervals.coords.len() - 1];
    let exact = 1e-12 * (hi - lo);

    for &p in points {
        if !(p > lo && p < hi) {
            continue;
        }
        // p > lo, so at least one edge is <= p
        let k = intervals.coords.partition_point(|&c| c <= p) - 1;
        let (left, right) = (intervals.coords[k], intervals.coords[k + 1]);
        let max_step = intervals.max_steps[k];
        let gap = (p - left).min(right - p);
        if gap <= tolerance * max_step {
            if gap > exact {
                diagnostics.warn(
                    Some(axis),
                    WarningKind::SnapPointDropped,
                    format!(
                        "snapping point {p} along {axis} is within {gap:.3e} of an existing \
                         boundary and was skipped"
                    ),
                );
            }
            continue;
        }
        intervals.coords.insert(k + 1, p);
        intervals.max_steps.insert(k + 1, max_step);
    }
    intervals
}
