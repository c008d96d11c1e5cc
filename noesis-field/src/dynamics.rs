// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Noesis-Proprietary
// See LICENSE in the repository root for full license terms.

//! Field Update Dynamics
//!
//! One explicit Euler step of the observed, driven, constrained field:
//!
//!   ΔΨ = η · (α·∇²Ψ − U′(Ψ) + λ_C·(O − Ψ) + λ_D·D − λ_E·E − λ_S·S)
//!
//! where ∇² is the 4-neighbour second difference under periodic boundaries
//! and U(x) = ½a·x² + ¼b·x⁴ is the quartic on-site potential. Both the
//! potential argument and its cubic term are clipped before use, and the
//! increment itself is clipped to ±`DELTA_LIMIT`, so no single term can
//! push the field into a runaway regime within one step.

use crate::grid::Grid;

/// Hard limit on the per-step field increment.
pub const DELTA_LIMIT: f64 = 0.3;

/// Coupling and integration constants of the field update.
///
/// `lambda_e` and `lambda_s` are not here: they adapt over the run and are
/// passed per step by the driver.
#[derive(Debug, Clone, Copy)]
pub struct UpdateParams {
    /// Integration rate η
    pub eta: f64,
    /// Diffusion coefficient α
    pub alpha: f64,
    /// Quadratic potential coefficient a
    pub a: f64,
    /// Quartic potential coefficient b
    pub b: f64,
    /// Observation coupling λ_C
    pub lambda_c: f64,
    /// Drive coupling λ_D
    pub lambda_d: f64,
}

/// Discrete Laplacian: −4Ψ(i,j) + the four wrap-around neighbours.
pub fn laplacian(psi: &Grid) -> Grid {
    let n = psi.n as isize;
    let mut out = Grid::zeros(psi.n);
    for r in 0..n {
        for c in 0..n {
            let v = -4.0 * psi.at(r, c)
                + psi.at(r - 1, c)
                + psi.at(r + 1, c)
                + psi.at(r, c - 1)
                + psi.at(r, c + 1);
            out.set(r as usize, c as usize, v);
        }
    }
    out
}

/// Derivative of the quartic potential, U′(x) = a·x + b·x³, with the
/// argument clipped to ±6 and the cubic term clipped to ±100.
#[inline]
pub fn potential_gradient(x: f64, a: f64, b: f64) -> f64 {
    let xc = x.clamp(-6.0, 6.0);
    a * xc + b * (xc * xc * xc).clamp(-100.0, 100.0)
}

/// Compose the clamped per-step increment ΔΨ from the field and the four
/// per-step signals. The caller adds the result to the field.
pub fn compose_update(
    psi: &Grid,
    observation: &Grid,
    drive: &Grid,
    correction: &Grid,
    constraint: &Grid,
    params: &UpdateParams,
    lambda_e: f64,
    lambda_s: f64,
) -> Grid {
    let lap = laplacian(psi);
    let mut delta = Grid::zeros(psi.n);
    for i in 0..psi.data.len() {
        let p = psi.data[i];
        let raw = params.eta
            * (params.alpha * lap.data[i] - potential_gradient(p, params.a, params.b)
                + params.lambda_c * (observation.data[i] - p)
                + params.lambda_d * drive.data[i]
                - lambda_e * correction.data[i]
                - lambda_s * constraint.data[i]);
        delta.data[i] = raw.clamp(-DELTA_LIMIT, DELTA_LIMIT);
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> UpdateParams {
        UpdateParams {
            eta: 0.06,
            alpha: 0.2,
            a: -0.5,
            b: 0.2,
            lambda_c: 0.3,
            lambda_d: 0.4,
        }
    }

    #[test]
    fn test_laplacian_of_uniform_is_zero() {
        let psi = Grid::from_fn(8, |_, _| 0.7);
        let lap = laplacian(&psi);
        assert!(
            lap.data.iter().all(|&v| v.abs() < 1e-12),
            "uniform field has zero Laplacian, max |v| = {}",
            lap.max_abs()
        );
    }

    #[test]
    fn test_laplacian_wraps() {
        // Single spike at the origin: its Laplacian reaches the far edges
        // through the periodic boundary.
        let mut psi = Grid::zeros(5);
        psi.set(0, 0, 1.0);
        let lap = laplacian(&psi);
        assert!((lap.get(0, 0) + 4.0).abs() < 1e-12);
        assert!((lap.get(4, 0) - 1.0).abs() < 1e-12, "wraps across rows");
        assert!((lap.get(0, 4) - 1.0).abs() < 1e-12, "wraps across cols");
        // Laplacian of any field sums to zero on a torus
        let total: f64 = lap.data.iter().sum();
        assert!(total.abs() < 1e-12);
    }

    #[test]
    fn test_potential_gradient_clips() {
        // Beyond the ±6 argument clip the gradient saturates.
        let g6 = potential_gradient(6.0, -0.5, 0.2);
        let g60 = potential_gradient(60.0, -0.5, 0.2);
        assert!((g6 - g60).abs() < 1e-12);
        // The cubic clip keeps the gradient finite for large b.
        let g = potential_gradient(6.0, 0.0, 10.0);
        assert!((g - 1000.0).abs() < 1e-9, "cubic term clipped at 100: {g}");
    }

    #[test]
    fn test_update_respects_delta_limit() {
        // Extreme drive forces the raw increment far past the clip.
        let psi = Grid::zeros(6);
        let obs = Grid::zeros(6);
        let drive = Grid::from_fn(6, |_, _| 1e6);
        let corr = Grid::zeros(6);
        let cons = Grid::zeros(6);
        let delta = compose_update(&psi, &obs, &drive, &corr, &cons, &params(), 0.15, 0.2);
        assert!(delta.data.iter().all(|&v| v.abs() <= DELTA_LIMIT + 1e-15));
        assert!((delta.max_abs() - DELTA_LIMIT).abs() < 1e-12);
    }

    #[test]
    fn test_zero_inputs_zero_delta() {
        let z = Grid::zeros(4);
        let delta = compose_update(&z, &z, &z, &z, &z, &params(), 0.15, 0.2);
        assert!(delta.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_observation_pulls_field() {
        // With only the observation coupling active, the field moves toward O.
        let psi = Grid::zeros(4);
        let obs = Grid::from_fn(4, |_, _| 1.0);
        let z = Grid::zeros(4);
        let p = UpdateParams {
            eta: 0.1,
            alpha: 0.0,
            a: 0.0,
            b: 0.0,
            lambda_c: 0.5,
            lambda_d: 0.0,
        };
        let delta = compose_update(&psi, &obs, &z, &z, &z, &p, 0.0, 0.0);
        assert!(
            delta.data.iter().all(|&v| (v - 0.05).abs() < 1e-12),
            "expected uniform pull of η·λ_C·(O−Ψ) = 0.05"
        );
    }
}
