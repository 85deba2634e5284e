// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! License validation endpoint, called by desktop clients during
//! activation. Public: the device authenticates with the key itself.

use crate::error::{AppError, Result};
use crate::services::quota;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/license/validate", post(validate_license))
}

#[derive(Deserialize)]
struct ValidateLicenseRequest {
    license_key: Option<String>,
    device_fingerprint: Option<String>,
}

/// Validation response; this shape is the desktop client's API contract.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ValidateLicenseResponse {
    pub valid: bool,
    pub user_id: String,
    pub device_id: String,
    pub tier: String,
    pub storage_limit_mb: u64,
    pub user_name: String,
    pub message: String,
}

/// Validate a license key and bind it to a device fingerprint.
async fn validate_license(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateLicenseRequest>,
) -> Result<Json<ValidateLicenseResponse>> {
    let license_key = req
        .license_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::BadRequest("license_key is required".to_string()))?;
    let fingerprint = req
        .device_fingerprint
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::BadRequest("device_fingerprint is required".to_string()))?;

    let activation = state
        .license
        .validate_and_activate(license_key, fingerprint)
        .await?;

    let message = if activation.reactivated {
        "License already active on this device".to_string()
    } else {
        "License activated".to_string()
    };

    Ok(Json(ValidateLicenseResponse {
        valid: true,
        user_id: activation.device.user_id.clone(),
        device_id: activation.device.id.clone(),
        tier: activation.profile.tier.as_str().to_string(),
        storage_limit_mb: quota::total_storage_mb(&activation.profile),
        user_name: activation.profile.display_name.clone(),
        message,
    }))
}
