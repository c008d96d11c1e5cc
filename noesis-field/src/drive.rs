//! Exogenous Drive Process
//!
//! Generates the forcing term injected into the field each step: an 80/20
//! blend of isotropic Gaussian noise and a deterministic standing-wave
//! pattern. The wave component is `sin(2π·t/60)` scaled along a linear
//! column ramp and repeated down every row, so it sweeps the whole field
//! through one oscillation every 60 steps.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::grid::Grid;

/// Period of the deterministic wave component, in steps.
const WAVE_PERIOD: f64 = 60.0;

/// Generate the drive field for step `t`.
///
/// The noise draw always happens, even at `strength = 0`, so the shared
/// random sequence advances identically across configurations.
pub fn generate(t: u64, n: usize, strength: f64, rng: &mut StdRng) -> Grid {
    let phase = (std::f64::consts::TAU * t as f64 / WAVE_PERIOD).sin();
    let mut out = Grid::zeros(n);
    for row in 0..n {
        for col in 0..n {
            let eps: f64 = rng.sample(StandardNormal);
            let base = 0.5 * eps;
            let ramp = if n > 1 {
                -1.0 + 2.0 * col as f64 / (n - 1) as f64
            } else {
                0.0
            };
            let wave = phase * ramp;
            out.set(row, col, strength * (0.8 * base + 0.2 * wave));
        }
    }
    out
}
