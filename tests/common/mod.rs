// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use murmur_api::config::Config;
use murmur_api::db::Db;
use murmur_api::middleware::auth::create_jwt;
use murmur_api::models::{Profile, SubscriptionTier};
use murmur_api::routes::create_router;
use murmur_api::services::LicenseService;
use murmur_api::AppState;
use std::sync::Arc;

/// Create a test app on the in-memory store.
/// Returns the router and the shared state for seeding.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Db::new_memory();
    let license = LicenseService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        license,
    });

    (create_router(state.clone()), state)
}

/// Create a JWT for a test user, signed with the test config key.
#[allow(dead_code)]
pub fn auth_token(state: &AppState, user_id: &str) -> String {
    create_jwt(user_id, &state.config.jwt_signing_key).expect("Failed to create JWT")
}

/// Seed a profile with a given tier.
#[allow(dead_code)]
pub async fn seed_profile(state: &AppState, user_id: &str, tier: SubscriptionTier) -> Profile {
    let profile = Profile {
        user_id: user_id.to_string(),
        display_name: "Test User".to_string(),
        email: Some(format!("{}@example.com", user_id)),
        tier,
        storage_limit_mb: tier.base_storage_mb(),
        storage_bonus_mb: 0,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    state
        .db
        .upsert_profile(&profile)
        .await
        .expect("Failed to seed profile");
    profile
}

/// Build an authenticated JSON request.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body was not valid JSON")
}

/// A well-formed device fingerprint (64 hex chars) derived from a seed.
#[allow(dead_code)]
pub fn test_fingerprint(seed: u8) -> String {
    format!("{:02x}", seed).repeat(32)
}
