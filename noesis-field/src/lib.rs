// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Noesis-Proprietary
// See LICENSE in the repository root for full license terms.

pub mod grid;
pub mod dynamics;
pub mod observer;
pub mod controller;
pub mod constraints;
pub mod drive;
pub mod trauma;
pub mod metrics;
