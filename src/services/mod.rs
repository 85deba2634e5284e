// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Business logic services.

pub mod license;
pub mod quota;

pub use license::LicenseService;
