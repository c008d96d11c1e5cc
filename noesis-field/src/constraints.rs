//! Global Constraint Field
//!
//! Produces a per-cell penalty combining two normalized terms on the
//! clipped field Ψc = clip(Ψ, ±2):
//!
//! - curvature: |∂xΨc| + |∂yΨc| (forward differences, wrap) — penalizes
//!   sharp spatial variation;
//! - boundary: max(|Ψc| − 1, 0) — penalizes excursions beyond unit
//!   magnitude.
//!
//! Each term is divided by its own field mean (+1e-6), making the penalty
//! scale-free: S = 0.2·curvature_norm + 0.5·boundary_norm.

use crate::grid::Grid;

/// Weight of the normalized curvature term.
const CURVATURE_WEIGHT: f64 = 0.2;
/// Weight of the normalized boundary-excursion term.
const BOUNDARY_WEIGHT: f64 = 0.5;

/// Evaluate the constraint penalty field.
pub fn evaluate(psi: &Grid) -> Grid {
    let clipped = psi.map(|v| v.clamp(-2.0, 2.0));

    let n = clipped.n as isize;
    let mut curvature = Grid::zeros(clipped.n);
    let mut boundary = Grid::zeros(clipped.n);
    for r in 0..n {
        for c in 0..n {
            let v = clipped.at(r, c);
            let gx = clipped.at(r, c + 1) - v;
            let gy = clipped.at(r + 1, c) - v;
            curvature.set(r as usize, c as usize, gx.abs() + gy.abs());
            boundary.set(r as usize, c as usize, (v.abs() - 1.0).max(0.0));
        }
    }

    let curv_mean = curvature.mean();
    let bound_mean = boundary.mean();
    let mut out = Grid::zeros(clipped.n);
    for i in 0..out.data.len() {
        out.data[i] = CURVATURE_WEIGHT * curvature.data[i] / (curv_mean + 1e-6)
            + BOUNDARY_WEIGHT * boundary.data[i] / (bound_mean + 1e-6);
    }
    out
}
