// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Noesis-Proprietary
// See LICENSE in the repository root for full license terms.

pub mod config;
pub mod meta;
pub mod record;
pub mod driver;

pub use config::SimConfig;
pub use driver::Simulation;
pub use record::{ObserverHealth, RunSummary, StepRecord};
