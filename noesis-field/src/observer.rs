// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Noesis-Proprietary
// See LICENSE in the repository root for full license terms.

//! Observation Operator with Emergency Reset
//!
//! The observer produces a smoothed, compressed view of the field:
//!
//!   O = clamp(tanh(0.3·(K ∗ Ψ) + 0.1·β·mean(Ψ)), −1.5, 1.5)
//!
//! where K is a fixed normalized 3×3 kernel with zero centre, convolved
//! under periodic boundaries. Because the centre weight is zero, each cell's
//! observation is built entirely from its neighbourhood — the observer never
//! sees a cell directly, only its surroundings.
//!
//! On top of the smoothing path sits a two-condition reset state machine
//! driven by the field/observation KL mismatch:
//!
//! - streak: `current_kl > KL_HIGH && last_kl > KL_PRIOR_HIGH` increments a
//!   consecutive-divergence counter, anything else decays it by one;
//! - reset: `streak > STREAK_LIMIT || current_kl > KL_ACUTE` abandons the
//!   kernel path for this call and returns the raw fallback
//!   `tanh(0.5·Ψ + 0.1·ε)` with fresh noise ε.
//!
//! `last_kl` is deliberately not updated on the reset path: the next call
//! compares against the last mismatch the observer actually absorbed, so a
//! single reset does not mask a sustained divergence.
//!
//! The observer carries no interior mutability. Its counters live in an
//! [`ObserverState`] value and `observe` returns the successor state next to
//! the observation, so a caller owns exactly one writer for the state.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Fixed smoothing kernel: zero centre, 0.15 on edges, 0.1 on corners.
/// Normalized to unit sum before use.
pub const SMOOTHING_KERNEL: [[f64; 3]; 3] = [
    [0.10, 0.15, 0.10],
    [0.15, 0.00, 0.15],
    [0.10, 0.15, 0.10],
];

/// Reset thresholds. The exact values are load-bearing for run behaviour;
/// tune them here, not inline.
#[derive(Debug, Clone, Copy)]
pub struct ResetPolicy {
    /// Mismatch level above which the current step counts toward the streak
    pub kl_high: f64,
    /// Mismatch level the previous step must also have exceeded
    pub kl_prior_high: f64,
    /// Consecutive-divergence count that forces a reset
    pub streak_limit: u32,
    /// Mismatch level that forces an immediate reset regardless of streak
    pub kl_acute: f64,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            kl_high: 20.0,
            kl_prior_high: 15.0,
            streak_limit: 10,
            kl_acute: 25.0,
        }
    }
}

/// Observer counters, threaded through the run as a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObserverState {
    /// Total emergency resets so far; never decreases
    pub reset_count: u64,
    /// Mismatch from the last non-reset observation
    pub last_kl: f64,
    /// Consecutive steps of sustained mismatch growth
    pub kl_increase_streak: u32,
}

/// Gradient-magnitude weighting of the field, normalized by its own mean.
///
/// Forward differences under wrap; the squared magnitude is clipped to 1e6
/// before the square root so a single blown-up cell cannot poison the
/// normalization.
pub fn gradient_weighting(psi: &Grid) -> Grid {
    let n = psi.n as isize;
    let mut gmag = Grid::zeros(psi.n);
    for r in 0..n {
        for c in 0..n {
            let v = psi.at(r, c);
            let gx = psi.at(r, c + 1) - v;
            let gy = psi.at(r + 1, c) - v;
            let mag_sq = (gx * gx + gy * gy).clamp(0.0, 1e6);
            gmag.set(r as usize, c as usize, mag_sq.sqrt());
        }
    }
    let mean = gmag.mean();
    gmag.map(|v| v / (mean + 1e-6))
}

/// The normalized smoothing kernel.
pub fn smoothing_kernel() -> [[f64; 3]; 3] {
    let sum: f64 = SMOOTHING_KERNEL.iter().flatten().sum();
    let mut k = SMOOTHING_KERNEL;
    for row in &mut k {
        for w in row {
            *w /= sum;
        }
    }
    k
}

/// 3×3 convolution under periodic boundaries.
pub fn convolve3(psi: &Grid, kernel: &[[f64; 3]; 3]) -> Grid {
    let n = psi.n as isize;
    let mut out = Grid::zeros(psi.n);
    for r in 0..n {
        for c in 0..n {
            let mut acc = 0.0;
            for (dr, krow) in kernel.iter().enumerate() {
                for (dc, &w) in krow.iter().enumerate() {
                    acc += w * psi.at(r + dr as isize - 1, c + dc as isize - 1);
                }
            }
            out.set(r as usize, c as usize, acc);
        }
    }
    out
}

/// Observe the field.
///
/// Pure in the functional sense: the successor [`ObserverState`] is returned,
/// never written in place. `current_kl` is the mismatch measured after the
/// previous step (0 on the first call); `rng` is consumed only on the
/// fallback path.
pub fn observe(
    state: &ObserverState,
    psi: &Grid,
    beta: f64,
    current_kl: f64,
    policy: &ResetPolicy,
    rng: &mut StdRng,
) -> (ObserverState, Grid) {
    let mut next = *state;

    // Streak transition: sustained growth counts up, anything else decays.
    if current_kl > policy.kl_high && state.last_kl > policy.kl_prior_high {
        next.kl_increase_streak += 1;
    } else {
        next.kl_increase_streak = next.kl_increase_streak.saturating_sub(1);
    }

    // Reset transition: sustained or acute mismatch abandons the kernel path.
    // last_kl intentionally keeps its pre-reset value here.
    if next.kl_increase_streak > policy.streak_limit || current_kl > policy.kl_acute {
        next.reset_count += 1;
        next.kl_increase_streak = 0;
        let fallback = psi.map(|v| v * 0.5);
        let mut obs = Grid::zeros(psi.n);
        for (o, &p) in obs.data.iter_mut().zip(fallback.data.iter()) {
            let eps: f64 = rng.sample(StandardNormal);
            *o = (p + 0.1 * eps).tanh();
        }
        return (next, obs);
    }

    // Adaptive weighting is evaluated but the smoothing kernel stays fixed.
    // TODO: characterise the weighting's effect on reset frequency before
    // folding it into the kernel.
    let _weighting = gradient_weighting(psi);

    let kernel = smoothing_kernel();
    let smoothed = convolve3(psi, &kernel);
    let bias = 0.1 * beta * psi.mean();
    let mut obs = smoothed.map(|v| (0.3 * v + bias).tanh());
    obs.clamp_assign(-1.5, 1.5);

    next.last_kl = current_kl;
    (next, obs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[test]
    fn test_kernel_normalized() {
        let k = smoothing_kernel();
        let sum: f64 = k.iter().flatten().sum();
        assert!((sum - 1.0).abs() < 1e-12, "kernel sums to {sum}");
        assert_eq!(k[1][1], 0.0, "centre weight must stay zero");
    }

    #[test]
    fn test_uniform_field_smooths_to_itself() {
        // Unit-sum kernel: convolving a constant field reproduces it.
        let psi = Grid::from_fn(8, |_, _| 0.4);
        let sm = convolve3(&psi, &smoothing_kernel());
        assert!(sm.data.iter().all(|&v| (v - 0.4).abs() < 1e-12));
    }

    #[test]
    fn test_convolution_wraps() {
        let mut psi = Grid::zeros(5);
        psi.set(0, 0, 1.0);
        let sm = convolve3(&psi, &smoothing_kernel());
        // The corner spike reaches the opposite corner through the wrap.
        assert!(sm.get(4, 4) > 0.0, "corner weight should wrap");
        assert_eq!(sm.get(0, 0), 0.0, "zero centre: the spike cannot see itself");
    }

    #[test]
    fn test_observation_bounded() {
        let psi = Grid::from_fn(16, |r, c| ((r * 31 + c * 17) % 7) as f64 - 3.0);
        let state = ObserverState::default();
        let (_, obs) = observe(&state, &psi, 0.2, 0.0, &ResetPolicy::default(), &mut rng());
        assert!(obs.data.iter().all(|&v| (-1.5..=1.5).contains(&v)));
    }

    #[test]
    fn test_acute_mismatch_forces_reset() {
        // current_kl = 30 > 25 fires immediately, from a clean state.
        let psi = Grid::from_fn(8, |_, _| 0.3);
        let state = ObserverState::default();
        let (next, obs) = observe(&state, &psi, 0.2, 30.0, &ResetPolicy::default(), &mut rng());
        assert_eq!(next.reset_count, 1);
        assert_eq!(next.kl_increase_streak, 0);
        // The fallback bypasses the kernel path: a uniform field would smooth
        // to a uniform observation, but the fallback noise breaks uniformity.
        let first = obs.get(0, 0);
        assert!(
            obs.data.iter().any(|&v| (v - first).abs() > 1e-9),
            "fallback observation must carry fresh noise"
        );
        assert!(obs.data.iter().all(|&v| v.abs() < 1.0), "tanh output");
    }

    #[test]
    fn test_reset_does_not_update_last_kl() {
        let psi = Grid::zeros(8);
        let state = ObserverState {
            reset_count: 0,
            last_kl: 3.0,
            kl_increase_streak: 0,
        };
        let (next, _) = observe(&state, &psi, 0.2, 30.0, &ResetPolicy::default(), &mut rng());
        assert_eq!(next.reset_count, 1);
        assert!(
            (next.last_kl - 3.0).abs() < 1e-12,
            "reset path must not absorb the triggering mismatch"
        );

        // Non-reset path does absorb it.
        let (after, _) = observe(&next, &psi, 0.2, 7.0, &ResetPolicy::default(), &mut rng());
        assert!((after.last_kl - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_streak_builds_and_fires() {
        // Ten sustained-divergence calls build the streak to 10; the
        // eleventh pushes it past the limit and fires the reset.
        let psi = Grid::zeros(8);
        let policy = ResetPolicy::default();
        let mut state = ObserverState {
            reset_count: 0,
            last_kl: 16.0,
            kl_increase_streak: 0,
        };
        let mut r = rng();
        for step in 1..=10 {
            let (next, _) = observe(&state, &psi, 0.2, 21.0, &policy, &mut r);
            state = next;
            assert_eq!(state.kl_increase_streak, step, "streak at call {step}");
            assert_eq!(state.reset_count, 0);
        }
        let (after, _) = observe(&state, &psi, 0.2, 21.0, &policy, &mut r);
        assert_eq!(after.reset_count, 1, "11th sustained call must reset");
        assert_eq!(after.kl_increase_streak, 0);
    }

    #[test]
    fn test_streak_decays_to_floor() {
        let psi = Grid::zeros(8);
        let policy = ResetPolicy::default();
        let mut state = ObserverState {
            reset_count: 0,
            last_kl: 0.0,
            kl_increase_streak: 2,
        };
        let mut r = rng();
        for _ in 0..5 {
            let (next, _) = observe(&state, &psi, 0.2, 1.0, &policy, &mut r);
            state = next;
        }
        assert_eq!(state.kl_increase_streak, 0, "streak decays and floors at 0");
        assert_eq!(state.reset_count, 0);
    }

    #[test]
    fn test_reset_count_monotone() {
        let psi = Grid::zeros(8);
        let policy = ResetPolicy::default();
        let mut state = ObserverState::default();
        let mut r = rng();
        let mut prev = 0;
        // Alternate acute and calm mismatches; the counter may only grow.
        for (i, kl) in [30.0, 1.0, 27.0, 0.0, 40.0, 2.0].iter().enumerate() {
            let (next, _) = observe(&state, &psi, 0.2, *kl, &policy, &mut r);
            assert!(
                next.reset_count >= prev,
                "reset_count regressed at call {i}"
            );
            prev = next.reset_count;
            state = next;
        }
        assert_eq!(state.reset_count, 3);
    }

    #[test]
    fn test_gradient_weighting_mean_near_one() {
        // Normalizing by the mean makes the weighting scale-free.
        let psi = Grid::from_fn(16, |r, c| ((r + 2 * c) % 5) as f64 * 0.3);
        let w = gradient_weighting(&psi);
        assert!((w.mean() - 1.0).abs() < 1e-3, "mean {}", w.mean());
        assert!(w.data.iter().all(|&v| v >= 0.0));
    }
}
