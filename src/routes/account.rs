// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Account routes for the signed-in user.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::Profile;
use crate::services::quota::{self, StorageStats};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me))
}

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub tier: String,
    pub storage: StorageStats,
    pub device_count: u32,
    pub device_limit: u32,
}

/// Get the current user's profile, storage quota and device usage.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .unwrap_or_else(|| Profile::default_free(&user.user_id));
    let devices = state.db.list_devices_for_user(&user.user_id).await?;

    Ok(Json(MeResponse {
        user_id: profile.user_id.clone(),
        display_name: profile.display_name.clone(),
        email: profile.email.clone(),
        tier: profile.tier.as_str().to_string(),
        storage: quota::storage_stats(&profile, &devices),
        device_count: devices.len() as u32,
        device_limit: profile.tier.device_limit(),
    }))
}
