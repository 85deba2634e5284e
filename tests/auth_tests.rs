// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Authentication tests.
//!
//! Protected routes must reject missing, malformed and unsigned tokens,
//! and accept both the session cookie and the Authorization header.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/devices")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_garbage_token_is_unauthorized() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/devices")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_wrong_key_is_rejected() {
    let (app, _state) = common::create_test_app();
    let token =
        murmur_api::middleware::auth::create_jwt("user-1", b"some_other_signing_key_entirely")
            .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/devices")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    let (app, state) = common::create_test_app();
    let token = common::auth_token(&state, "user-1");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/devices")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let (app, state) = common::create_test_app();
    let token = common::auth_token(&state, "user-1");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::COOKIE, format!("murmur_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_check_is_public() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_me_returns_profile_and_quota() {
    let (app, state) = common::create_test_app();
    common::seed_profile(&state, "user-1", murmur_api::models::SubscriptionTier::Pro).await;
    let token = common::auth_token(&state, "user-1");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["user_id"], "user-1");
    assert_eq!(body["tier"], "pro");
    assert_eq!(body["device_limit"], 10);
    assert_eq!(body["storage"]["total_mb"], 2000);
    assert_eq!(body["device_count"], 0);
}
