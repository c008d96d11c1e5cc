//! Scheduled Perturbation Injector
//!
//! Builds a large random perturbation whose strength adapts inversely to
//! the field's current stability, measured as the coefficient-of-variation
//! style ratio std(Ψ)/(mean|Ψ|+ε). A calm, ordered field receives a harder
//! kick than one already in flux — the injector probes recovery, it does
//! not pile onto an existing collapse.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::grid::Grid;

/// Build the perturbation pattern for the current field.
///
/// Returns the pattern and its mean absolute magnitude. The caller decides
/// when to apply it; scheduling lives with the driver.
pub fn inject(psi: &Grid, base_strength: f64, rng: &mut StdRng) -> (Grid, f64) {
    let stability = psi.std_dev() / (psi.mean_abs() + 1e-6);
    let multiplier = 0.5 + 0.3 / (stability + 0.5);

    let mut pattern = Grid::zeros(psi.n);
    for v in &mut pattern.data {
        let eps: f64 = rng.sample(StandardNormal);
        *v = base_strength * multiplier * eps;
    }
    let magnitude = pattern.mean_abs();
    (pattern, magnitude)
}
