// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Murmur API: backend for the Murmur voice-to-pattern assistant.
//!
//! This crate provides the device registration, license activation and
//! feedback endpoints used by the desktop client and editor extension,
//! plus the sprint orchestration component used by the SDK.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod sprint;

use config::Config;
use db::Db;
use services::LicenseService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub license: LicenseService,
}
