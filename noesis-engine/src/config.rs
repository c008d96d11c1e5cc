//! Run Configuration
//!
//! Every tunable scalar of a simulation run in one serde-friendly struct.
//! The defaults reproduce the canonical observer-protection run; presets
//! cover the quiescent regime used by the stability tests.

use serde::{Deserialize, Serialize};

/// Full configuration for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Grid side length N (the field is N×N)
    pub n: usize,
    /// Number of simulation steps T
    pub steps: u64,
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
    /// Initial correction gain λ_E (adapted over the run)
    pub lambda_e: f64,
    /// Initial constraint gain λ_S (adapted over the run)
    pub lambda_s: f64,
    /// Observer bias β
    pub beta_obs: f64,
    /// Field-energy gradient weight κ
    pub kappa: f64,
    /// Free-energy mismatch weight γ
    pub gamma: f64,
    /// Free-energy dominance weight ξ
    pub xi: f64,
    /// Controller gain θ (immutable for the run)
    pub theta: f64,
    /// Meta-adaptation learning rate
    pub meta_lr: f64,
    /// Drive strength
    pub drive_strength: f64,
    /// Steps at which a perturbation is injected
    pub trauma_steps: Vec<u64>,
    /// Base strength of injected perturbations
    pub trauma_strength: f64,
    /// Amplitude of the initial (and post-divergence) noise field
    pub init_amplitude: f64,
    /// Seed for the run's random sequence
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            n: 128,
            steps: 1000,
            eta: 0.06,
            alpha: 0.2,
            a: -0.5,
            b: 0.2,
            lambda_c: 0.3,
            lambda_d: 0.4,
            lambda_e: 0.15,
            lambda_s: 0.2,
            beta_obs: 0.2,
            kappa: 0.3,
            gamma: 0.2,
            xi: 0.02,
            theta: 0.3,
            meta_lr: 0.005,
            drive_strength: 0.8,
            trauma_steps: vec![300, 600],
            trauma_strength: 0.8,
            init_amplitude: 0.05,
            seed: 11,
        }
    }
}

impl SimConfig {
    /// Quiescent preset: zero-amplitude start, no drive, no perturbation
    /// schedule, adaptive gains starting from zero. The field evolves under
    /// the potential, diffusion and observation terms alone.
    pub fn quiescent() -> Self {
        Self {
            drive_strength: 0.0,
            trauma_steps: Vec::new(),
            lambda_e: 0.0,
            lambda_s: 0.0,
            init_amplitude: 0.0,
            ..Self::default()
        }
    }

    /// Validate the configuration. Returns a description of every
    /// violation; an empty list means the config is runnable.
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.n < 3 {
            violations.push(format!(
                "grid side n = {} is below the 3×3 stencil minimum",
                self.n
            ));
        }
        if self.steps == 0 {
            violations.push("step count must be positive".to_string());
        }
        if self.eta <= 0.0 {
            violations.push(format!("integration rate eta = {} must be positive", self.eta));
        }
        if !(0.0..=0.5).contains(&self.lambda_e) || !(0.0..=0.5).contains(&self.lambda_s) {
            violations.push(format!(
                "initial adaptive gains ({}, {}) must lie in [0, 0.5]",
                self.lambda_e, self.lambda_s
            ));
        }
        for &t in &self.trauma_steps {
            if t >= self.steps {
                violations.push(format!(
                    "perturbation step {t} is outside the run of {} steps",
                    self.steps
                ));
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SimConfig::default();
        assert_eq!(config.n, 128);
        assert_eq!(config.steps, 1000);
        assert_eq!(config.trauma_steps, vec![300, 600]);
        assert_eq!(config.seed, 11);
        assert!(config.validate().is_empty(), "{:?}", config.validate());
    }

    #[test]
    fn test_quiescent_preset() {
        let config = SimConfig::quiescent();
        assert_eq!(config.drive_strength, 0.0);
        assert!(config.trauma_steps.is_empty());
        assert_eq!(config.lambda_e, 0.0);
        assert_eq!(config.init_amplitude, 0.0);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = SimConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: SimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.n, config.n);
        assert!((restored.eta - config.eta).abs() < 1e-12);
        assert_eq!(restored.trauma_steps, config.trauma_steps);
    }

    #[test]
    fn test_validate_degenerate_grid() {
        let config = SimConfig {
            n: 2,
            ..SimConfig::default()
        };
        let violations = config.validate();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("stencil"));
    }

    #[test]
    fn test_validate_trauma_outside_run() {
        let config = SimConfig {
            steps: 100,
            trauma_steps: vec![50, 300],
            ..SimConfig::default()
        };
        let violations = config.validate();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("300"));
    }
}
