// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Device registration and management routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Device;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Device routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/devices", get(list_devices).post(create_device))
        .route("/api/devices/{id}", delete(delete_device))
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeviceResponse {
    pub id: String,
    pub name: String,
    pub device_type: String,
    pub license_key: String,
    pub status: String,
    pub fingerprint: Option<String>,
    pub storage_allocation_mb: u64,
    pub created_at: String,
    pub activated_at: Option<String>,
    pub last_validated_at: Option<String>,
}

impl From<&Device> for DeviceResponse {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id.clone(),
            name: device.name.clone(),
            device_type: device.device_type.clone(),
            license_key: device.license_key.clone(),
            status: device.status.as_str().to_string(),
            fingerprint: device.fingerprint.clone(),
            storage_allocation_mb: device.storage_allocation_mb,
            created_at: device.created_at.clone(),
            activated_at: device.activated_at.clone(),
            last_validated_at: device.last_validated_at.clone(),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DevicesResponse {
    pub devices: Vec<DeviceResponse>,
    pub count: u32,
    /// Device limit for the caller's tier
    pub limit: u32,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteDeviceResponse {
    pub success: bool,
    pub message: String,
}

// ─── Handlers ────────────────────────────────────────────────

/// List the caller's devices.
async fn list_devices(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DevicesResponse>> {
    let profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .unwrap_or_else(|| crate::models::Profile::default_free(&user.user_id));
    let devices = state.db.list_devices_for_user(&user.user_id).await?;

    Ok(Json(DevicesResponse {
        count: devices.len() as u32,
        limit: profile.tier.device_limit(),
        devices: devices.iter().map(DeviceResponse::from).collect(),
    }))
}

#[derive(Deserialize, Validate)]
struct CreateDeviceRequest {
    #[validate(length(min = 1, max = 100))]
    name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    device_type: Option<String>,
    /// Bounded by the largest tier total (enterprise base + bonus cap).
    #[validate(range(min = 1, max = 20_000))]
    storage_allocation_mb: Option<u64>,
}

/// Register a new device and issue its license key.
async fn create_device(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceResponse>)> {
    req.validate()
        .map_err(|e| AppError::BadRequest(format!("invalid device request: {}", e)))?;

    let device = state
        .license
        .issue_device(
            &user.user_id,
            req.name,
            req.device_type,
            req.storage_allocation_mb,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DeviceResponse::from(&device))))
}

/// Remove one of the caller's devices, freeing its license key and its
/// slot against the tier limit.
async fn delete_device(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(device_id): Path<String>,
) -> Result<Json<DeleteDeviceResponse>> {
    let device = state
        .db
        .get_device(&device_id)
        .await?
        // Treat other users' devices as not found rather than leaking
        // their existence.
        .filter(|d| d.user_id == user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("device {} not found", device_id)))?;

    state.db.delete_device(&device).await?;

    tracing::info!(user_id = %user.user_id, device_id = %device.id, "Device removed");

    Ok(Json(DeleteDeviceResponse {
        success: true,
        message: "Device removed; its license key is no longer valid.".to_string(),
    }))
}
