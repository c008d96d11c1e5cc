// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Noesis-Proprietary
// See LICENSE in the repository root for full license terms.

//! Simulation Driver
//!
//! Owns the field, the observer counters, the adaptive gains, the random
//! sequence and every history, and sequences one step of the coupled system:
//!
//! 1. divergence check — a non-finite or runaway field is thrown away and
//!    reseeded with small noise (coarse recovery, no history rollback)
//! 2. scheduled perturbation injection
//! 3. hard field clamp to ±2.5
//! 4. observation (fed the previous step's mismatch)
//! 5. drive → controller correction → constraint penalty
//! 6. clamped Euler update of the field
//! 7. metric evaluation and history append
//! 8. meta-adaptation of (λ_E, λ_S)
//!
//! Randomness is one `StdRng` seeded from the configuration and consumed in
//! a fixed order (field init, then per step: trauma → observer fallback →
//! drive), which is what makes two identically-configured runs identical.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use noesis_field::constraints;
use noesis_field::controller::Controller;
use noesis_field::drive;
use noesis_field::dynamics::{self, UpdateParams};
use noesis_field::grid::Grid;
use noesis_field::metrics::{self, EnergyParams};
use noesis_field::observer::{self, ObserverState, ResetPolicy};
use noesis_field::trauma;

use crate::config::SimConfig;
use crate::meta;
use crate::record::{ObserverHealth, RunSummary, StepRecord};

/// Field clamp applied at the top of every step.
const FIELD_LIMIT: f64 = 2.5;
/// Mean |Ψ| beyond which the field counts as diverged.
const DIVERGENCE_LIMIT: f64 = 5.0;

/// A running simulation: field state, observer counters, adaptive gains,
/// histories and the shared random sequence.
pub struct Simulation {
    config: SimConfig,
    update: UpdateParams,
    energy: EnergyParams,
    controller: Controller,
    reset_policy: ResetPolicy,
    rng: StdRng,

    psi: Grid,
    observer: ObserverState,
    lambda_e: f64,
    lambda_s: f64,
    step: u64,

    free_energy_hist: Vec<f64>,
    mismatch_hist: Vec<f64>,
    mi_hist: Vec<f64>,
    dominance_hist: Vec<f64>,
    lambda_e_hist: Vec<f64>,
    lambda_s_hist: Vec<f64>,
    trauma_events: Vec<u64>,
    observer_resets: Vec<u64>,
    field_resets: Vec<u64>,
    best_free_energy: f64,
}

impl Simulation {
    /// Build a simulation from a validated configuration and seed its field.
    pub fn new(config: SimConfig) -> Result<Self> {
        let violations = config.validate();
        if !violations.is_empty() {
            bail!("invalid configuration: {}", violations.join("; "));
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut psi = Grid::zeros(config.n);
        psi.fill_noise(&mut rng, config.init_amplitude);

        Ok(Self {
            update: UpdateParams {
                eta: config.eta,
                alpha: config.alpha,
                a: config.a,
                b: config.b,
                lambda_c: config.lambda_c,
                lambda_d: config.lambda_d,
            },
            energy: EnergyParams {
                a: config.a,
                b: config.b,
                kappa: config.kappa,
            },
            controller: Controller::new(config.theta),
            reset_policy: ResetPolicy::default(),
            lambda_e: config.lambda_e,
            lambda_s: config.lambda_s,
            psi,
            observer: ObserverState::default(),
            rng,
            step: 0,
            free_energy_hist: Vec::with_capacity(config.steps as usize),
            mismatch_hist: Vec::with_capacity(config.steps as usize),
            mi_hist: Vec::with_capacity(config.steps as usize),
            dominance_hist: Vec::with_capacity(config.steps as usize),
            lambda_e_hist: Vec::with_capacity(config.steps as usize),
            lambda_s_hist: Vec::with_capacity(config.steps as usize),
            trauma_events: Vec::new(),
            observer_resets: Vec::new(),
            field_resets: Vec::new(),
            best_free_energy: f64::INFINITY,
            config,
        })
    }

    /// Advance the system by one step and report it.
    pub fn step(&mut self) -> StepRecord {
        let t = self.step;

        // Divergence recovery: discard and reseed rather than repair.
        let field_reset = self.psi.has_non_finite() || self.psi.mean_abs() > DIVERGENCE_LIMIT;
        if field_reset {
            self.psi.fill_noise(&mut self.rng, self.config.init_amplitude.max(0.05));
            self.field_resets.push(t);
        }

        // Scheduled perturbation, applied before the boundary clamp.
        let mut trauma_magnitude = None;
        if self.config.trauma_steps.contains(&t) {
            let (pattern, magnitude) =
                trauma::inject(&self.psi, self.config.trauma_strength, &mut self.rng);
            self.psi.add_assign(&pattern);
            self.trauma_events.push(t);
            trauma_magnitude = Some(magnitude);
        }

        self.psi.clamp_assign(-FIELD_LIMIT, FIELD_LIMIT);

        // Observe, feeding back the previous step's mismatch.
        let prev_mismatch = self.mismatch_hist.last().copied().unwrap_or(0.0);
        let resets_before = self.observer.reset_count;
        let (observer_next, observation) = observer::observe(
            &self.observer,
            &self.psi,
            self.config.beta_obs,
            prev_mismatch,
            &self.reset_policy,
            &mut self.rng,
        );
        self.observer = observer_next;
        let observer_reset = self.observer.reset_count > resets_before;
        if observer_reset {
            self.observer_resets.push(t);
        }

        let drive_field = drive::generate(t, self.config.n, self.config.drive_strength, &mut self.rng);
        let correction = self.controller.act(&self.psi, &drive_field);
        let constraint = constraints::evaluate(&self.psi);

        let delta = dynamics::compose_update(
            &self.psi,
            &observation,
            &drive_field,
            &correction,
            &constraint,
            &self.update,
            self.lambda_e,
            self.lambda_s,
        );
        self.psi.add_assign(&delta);

        // Metrics on the updated field against this step's observation.
        let sample = metrics::free_energy(
            &self.psi,
            &observation,
            &correction,
            &self.energy,
            self.config.gamma,
            self.config.xi,
        );
        let mi = metrics::mutual_information(&self.psi, &observation);

        self.free_energy_hist.push(sample.total());
        self.mismatch_hist.push(sample.mismatch());
        self.mi_hist.push(mi);
        self.dominance_hist.push(sample.dominance());
        if sample.total() < self.best_free_energy {
            self.best_free_energy = sample.total();
        }

        // Slow meta-adaptation, then thread the new gains into the next step.
        let (lambda_e, lambda_s) = meta::adapt(
            self.lambda_e,
            self.lambda_s,
            sample.dominance(),
            sample.mismatch(),
            self.config.meta_lr,
        );
        self.lambda_e = lambda_e;
        self.lambda_s = lambda_s;
        self.lambda_e_hist.push(lambda_e);
        self.lambda_s_hist.push(lambda_s);

        self.step += 1;

        StepRecord {
            step: t,
            free_energy: sample.total(),
            mismatch: sample.mismatch(),
            mutual_information: mi,
            dominance: sample.dominance(),
            lambda_e,
            lambda_s,
            mean_abs_field: self.psi.mean_abs(),
            trauma_magnitude,
            observer_reset,
            field_reset,
            metric_fallback: sample.is_fallback(),
        }
    }

    /// Run every remaining step and assemble the summary.
    pub fn run(mut self) -> RunSummary {
        while self.step < self.config.steps {
            self.step();
        }
        self.into_summary()
    }

    /// True once the configured number of steps has completed.
    pub fn is_complete(&self) -> bool {
        self.step >= self.config.steps
    }

    /// Steps executed so far.
    pub fn current_step(&self) -> u64 {
        self.step
    }

    /// Total steps the run is configured for.
    pub fn total_steps(&self) -> u64 {
        self.config.steps
    }

    /// The current field state.
    pub fn field(&self) -> &Grid {
        &self.psi
    }

    /// The observer's counters.
    pub fn observer_state(&self) -> &ObserverState {
        &self.observer
    }

    /// Current adaptive gains (λ_E, λ_S).
    pub fn gains(&self) -> (f64, f64) {
        (self.lambda_e, self.lambda_s)
    }

    /// Consume the simulation into its summary.
    pub fn into_summary(self) -> RunSummary {
        let final_mismatch = self.mismatch_hist.last().copied().unwrap_or(0.0);
        let final_mi = self.mi_hist.last().copied().unwrap_or(0.0);
        let delta = match (self.free_energy_hist.first(), self.free_energy_hist.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        };
        RunSummary {
            final_field: self.psi,
            free_energy: self.free_energy_hist,
            mismatch: self.mismatch_hist,
            mutual_information: self.mi_hist,
            dominance: self.dominance_hist,
            lambda_e: self.lambda_e_hist,
            lambda_s: self.lambda_s_hist,
            trauma_events: self.trauma_events,
            observer_resets: self.observer_resets,
            field_resets: self.field_resets,
            best_free_energy: self.best_free_energy,
            health: ObserverHealth::classify(final_mismatch, final_mi, delta),
        }
    }
}
