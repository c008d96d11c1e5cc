//! Corrective Controller
//!
//! A deterministic, stateless regulator. It predicts where the driven field
//! is headed — `pred = tanh(Ψc + 0.2·Dc)` on clipped inputs — and emits a
//! gain-scaled correction toward that prediction, hard-limited to ±0.5 so
//! the controller can never dominate a single step outright.

use crate::grid::Grid;

/// Hard limit on the correction signal.
pub const CORRECTION_LIMIT: f64 = 0.5;

/// Stateless corrective controller with a fixed gain.
#[derive(Debug, Clone, Copy)]
pub struct Controller {
    /// Correction gain θ; immutable for the run
    pub theta: f64,
}

impl Controller {
    pub fn new(theta: f64) -> Self {
        Self { theta }
    }

    /// Compute the bounded correction E = clamp(θ·(pred − Ψc), ±0.5).
    pub fn act(&self, psi: &Grid, drive: &Grid) -> Grid {
        psi.zip_map(drive, |p, d| {
            let pc = p.clamp(-2.0, 2.0);
            let dc = d.clamp(-1.0, 1.0);
            let pred = (pc + 0.2 * dc).tanh();
            (self.theta * (pred - pc)).clamp(-CORRECTION_LIMIT, CORRECTION_LIMIT)
        })
    }
}
