//! Graded step synthesis across consecutive intervals.
//!
//! Every interval boundary ("node") carries a nominal step `b` that the cells
//! on both sides of it start from. Inside an interval with ends `bl`, `br`
//! and ceiling `d`, the nominal profile for `m` cells is the envelope
//!
//! ```text
//! e_j = min(d, bl * r^j, br * r^(m-1-j))      j = 0..m
//! ```
//!
//! which starts at `bl`, ends at `br` and never changes by more than `r`
//! between neighbours. The smallest `m` whose envelope covers the interval is
//! taken and the profile is scaled down onto the exact interval length. As
//! long as the scale factor stays within `[1/r, 1]`, neighbouring intervals
//! meet with a step ratio of at most `r`, because both sides of a node start
//! from the same nominal `b`.
//!
//! When an interval cannot be fitted with its current node steps, the larger
//! of the two is reduced by `r` and all intervals are swept again until a
//! fixed point is reached.

use crate::error::{GridError, Result};
use crate::geometry::Axis;

/// Relative slack for floating-point comparisons on step sizes
const REL_EPS: f64 = 1e-12;
/// Upper bound on relaxation sweeps before giving up
const MAX_SWEEPS: usize = 10_000;

/// Nominal cell profile of one interval
#[derive(Debug, Clone, Copy)]
struct Envelope {
    max_dl: f64,
    left: f64,
    right: f64,
    scale: f64,
}

impl Envelope {
    fn step(&self, j: usize, m: usize) -> f64 {
        let from_left = self.left * self.scale.powi(j as i32);
        let from_right = self.right * self.scale.powi((m - 1 - j) as i32);
        self.max_dl.min(from_left).min(from_right)
    }

    fn total(&self, m: usize) -> f64 {
        (0..m).map(|j| self.step(j, m)).sum()
    }

    /// Fewest cells that let the profile start at `left` and end at `right`
    fn min_cells(&self) -> usize {
        let (lo, hi) = if self.left < self.right {
            (self.left, self.right)
        } else {
            (self.right, self.left)
        };
        if hi <= lo * (1.0 + REL_EPS) {
            return 1;
        }
        let growths = ((hi / lo).ln() / self.scale.ln() - REL_EPS).ceil().max(1.0);
        growths as usize + 1
    }

    /// Smallest cell count whose profile is at least `len` long
    fn cells_for(&self, len: f64) -> usize {
        let target = len * (1.0 - REL_EPS);
        let mut lo = self.min_cells();
        if self.total(lo) >= target {
            return lo;
        }
        // every cell is at least min(left, right), so doubling terminates
        let mut hi = lo * 2;
        while self.total(hi) < target {
            lo = hi;
            hi *= 2;
        }
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.total(mid) >= target {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    }
}

/// Steps filling an interval of length `len` whose first cell is nominally
/// `left` and last cell nominally `right`. `None` when the scale factor onto
/// `len` would fall below `1 / max_scale`.
fn fit_interval(len: f64, max_dl: f64, left: f64, right: f64, max_scale: f64) -> Option<Vec<f64>> {
    let envelope = Envelope {
        max_dl,
        left,
        right,
        scale: max_scale,
    };
    let m = envelope.cells_for(len);
    let total = envelope.total(m);
    if total > max_scale * len * (1.0 + REL_EPS) {
        return None;
    }
    let shrink = len / total;
    Some((0..m).map(|j| envelope.step(j, m) * shrink).collect())
}

fn initial_node_steps(max_dl: &[f64], len_interval: &[f64], is_periodic: bool) -> Vec<f64> {
    let n = len_interval.len();
    let cap = |k: usize| max_dl[k].min(len_interval[k]);
    let mut nodes = Vec::with_capacity(n + 1);
    nodes.push(cap(0));
    for i in 1..n {
        nodes.push(cap(i - 1).min(cap(i)));
    }
    nodes.push(cap(n - 1));
    if is_periodic {
        sync_periodic(&mut nodes);
    }
    nodes
}

/// The first and last node are the same node on a periodic axis
fn sync_periodic(nodes: &mut [f64]) {
    let n = nodes.len() - 1;
    let wrap = nodes[0].min(nodes[n]);
    nodes[0] = wrap;
    nodes[n] = wrap;
}

/// Step sizes for every interval along an axis.
///
/// `max_dl[k]` is the ceiling and `len_interval[k]` the length of interval `k`.
/// The returned steps of interval `k` sum to `len_interval[k]`; neighbouring
/// steps, including across intervals and (if `is_periodic`) across the wrap,
/// differ by at most `max_scale`.
pub fn make_grid_multiple_intervals(
    axis: Axis,
    max_dl: &[f64],
    len_interval: &[f64],
    max_scale: f64,
    is_periodic: bool,
) -> Result<Vec<Vec<f64>>> {
    let n = len_interval.len();
    if n == 0 || max_dl.len() != n {
        return Err(GridError::internal(
            axis,
            format!("{} ceilings for {} intervals", max_dl.len(), n),
        ));
    }
    if let Some(bad) = len_interval.iter().chain(max_dl).find(|v| !(**v > 0.0)) {
        return Err(GridError::internal(
            axis,
            format!("non-positive interval length or step {bad}"),
        ));
    }

    let mut nodes = initial_node_steps(max_dl, len_interval, is_periodic);
    for sweep in 0..MAX_SWEEPS {
        let mut relaxed = false;
        for k in 0..n {
            let (left, right) = (nodes[k], nodes[k + 1]);
            if fit_interval(len_interval[k], max_dl[k], left, right, max_scale).is_some() {
                continue;
            }
            relaxed = true;
            if left > right * (1.0 + REL_EPS) {
                nodes[k] = left / max_scale;
            } else if right > left * (1.0 + REL_EPS) {
                nodes[k + 1] = right / max_scale;
            } else {
                nodes[k] = left / max_scale;
                nodes[k + 1] = right / max_scale;
            }
            if is_periodic {
                sync_periodic(&mut nodes);
            }
        }

        if !relaxed {
            tracing::debug!(%axis, intervals = n, sweeps = sweep + 1, "graded grid converged");
            return (0..n)
                .map(|k| {
                    fit_interval(len_interval[k], max_dl[k], nodes[k], nodes[k + 1], max_scale)
                        .ok_or_else(|| GridError::internal(axis, format!("interval {k} lost its fit")))
                })
                .collect();
        }
    }

    Err(GridError::internal(
        axis,
        format!("step grading did not converge after {MAX_SWEEPS} sweeps"),
    ))
}
