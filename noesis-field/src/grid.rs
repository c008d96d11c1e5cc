// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Noesis-Proprietary
// See LICENSE in the repository root for full license terms.

//! Dense Periodic Scalar Grid
//!
//! The Grid stores an n×n real-valued field in flat row-major layout.
//! Boundary conditions are periodic in both directions: index arithmetic
//! wraps, so the domain is a 2-torus. All field-wide reductions (mean,
//! deviation, magnitude) are plain sequential folds — each step of the
//! simulation depends on the complete previous field, so there is nothing
//! to gain from restructuring them.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// An n×n scalar field with periodic boundaries, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Side length of the square domain
    pub n: usize,
    /// Field values, row-major: data[row * n + col]
    pub data: Vec<f64>,
}

impl Grid {
    /// All-zero field.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Field filled from a generator over (row, col).
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(n * n);
        for row in 0..n {
            for col in 0..n {
                data.push(f(row, col));
            }
        }
        Self { n, data }
    }

    /// Fill every cell with `amplitude * ε`, ε ~ N(0, 1).
    ///
    /// Draws exactly n² samples from `rng` regardless of amplitude, so the
    /// position of the shared random sequence stays fixed across
    /// configurations that only differ in amplitude.
    pub fn fill_noise(&mut self, rng: &mut StdRng, amplitude: f64) {
        for v in &mut self.data {
            let eps: f64 = rng.sample(StandardNormal);
            *v = amplitude * eps;
        }
    }

    /// Value at (row, col) with wrap-around on both indices.
    ///
    /// Accepts signed offsets so stencil code can write `at(r - 1, c + 1)`
    /// without pre-wrapping.
    #[inline]
    pub fn at(&self, row: isize, col: isize) -> f64 {
        let n = self.n as isize;
        let r = row.rem_euclid(n) as usize;
        let c = col.rem_euclid(n) as usize;
        self.data[r * self.n + c]
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n + col] = value;
    }

    /// Elementwise map into a new grid.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Grid {
        Grid {
            n: self.n,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Elementwise combination with another grid of the same size.
    pub fn zip_map(&self, other: &Grid, f: impl Fn(f64, f64) -> f64) -> Grid {
        debug_assert_eq!(self.n, other.n);
        Grid {
            n: self.n,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// In-place elementwise addition.
    pub fn add_assign(&mut self, other: &Grid) {
        debug_assert_eq!(self.n, other.n);
        for (v, &o) in self.data.iter_mut().zip(other.data.iter()) {
            *v += o;
        }
    }

    /// In-place clamp of every element to [lo, hi].
    pub fn clamp_assign(&mut self, lo: f64, hi: f64) {
        for v in &mut self.data {
            *v = v.clamp(lo, hi);
        }
    }

    /// Arithmetic mean over all cells.
    pub fn mean(&self) -> f64 {
        let n = self.data.len();
        if n == 0 {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / n as f64
    }

    /// Mean of |value| over all cells.
    pub fn mean_abs(&self) -> f64 {
        let n = self.data.len();
        if n == 0 {
            return 0.0;
        }
        self.data.iter().map(|v| v.abs()).sum::<f64>() / n as f64
    }

    /// Population standard deviation (divisor n, not n-1).
    pub fn std_dev(&self) -> f64 {
        let n = self.data.len();
        if n == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .data
            .iter()
            .map(|&v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;
        var.sqrt()
    }

    /// True if any cell is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.data.iter().any(|v| !v.is_finite())
    }

    /// Largest |value| over all cells.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, &v| m.max(v.abs()))
    }
}
