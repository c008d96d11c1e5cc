//! Per-Step Records and the End-of-Run Summary
//!
//! The driver's output contract: one `StepRecord` per completed step for
//! live consumers (progress printers), and a `RunSummary` with the full
//! histories, event lists and a coarse observer-health classification for
//! everything downstream. Formatting is the consumer's business.

use noesis_field::grid::Grid;
use serde::{Deserialize, Serialize};

/// Everything a progress consumer needs about one completed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: u64,
    pub free_energy: f64,
    pub mismatch: f64,
    pub mutual_information: f64,
    pub dominance: f64,
    pub lambda_e: f64,
    pub lambda_s: f64,
    /// Mean |Ψ| after the step's update
    pub mean_abs_field: f64,
    /// Mean absolute magnitude of an injected perturbation, if one fired
    pub trauma_magnitude: Option<f64>,
    /// Whether the observer's emergency reset fired this step
    pub observer_reset: bool,
    /// Whether the driver reinitialised a diverged field this step
    pub field_reset: bool,
    /// Whether the free-energy sample was the fallback substitute
    pub metric_fallback: bool,
}

/// Coarse end-of-run classification of observer integration quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObserverHealth {
    /// Low final mismatch and solid mutual information
    Healthy,
    /// Moderate mismatch, some shared information
    Stable,
    /// Free energy did not blow up, but the observer tracks poorly
    Degraded,
    /// Sustained high mismatch
    Unstable,
}

impl ObserverHealth {
    /// Classify from the final mismatch, final mutual information, and the
    /// first-to-last free-energy delta.
    pub fn classify(final_mismatch: f64, final_mi: f64, performance_delta: f64) -> Self {
        if final_mismatch < 10.0 && final_mi > 0.05 {
            Self::Healthy
        } else if final_mismatch < 15.0 && final_mi > 0.02 {
            Self::Stable
        } else if performance_delta < 2.0 {
            Self::Degraded
        } else {
            Self::Unstable
        }
    }
}

/// The definitive output of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Field state after the final step
    pub final_field: Grid,
    /// Per-step free energy
    pub free_energy: Vec<f64>,
    /// Per-step field/observation KL mismatch
    pub mismatch: Vec<f64>,
    /// Per-step mutual information
    pub mutual_information: Vec<f64>,
    /// Per-step controller dominance
    pub dominance: Vec<f64>,
    /// Per-step adapted λ_E
    pub lambda_e: Vec<f64>,
    /// Per-step adapted λ_S
    pub lambda_s: Vec<f64>,
    /// Steps at which a perturbation was injected
    pub trauma_events: Vec<u64>,
    /// Steps at which the observer's emergency reset fired
    pub observer_resets: Vec<u64>,
    /// Steps at which the driver reinitialised a diverged field
    pub field_resets: Vec<u64>,
    /// Lowest free energy seen across the run
    pub best_free_energy: f64,
    /// Observer-health classification
    pub health: ObserverHealth,
}

impl RunSummary {
    /// Number of completed steps.
    pub fn steps(&self) -> usize {
        self.free_energy.len()
    }

    /// Free-energy drift from the first to the last step.
    pub fn performance_delta(&self) -> f64 {
        match (self.free_energy.first(), self.free_energy.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}
