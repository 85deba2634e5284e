// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Concurrent activation tests: racing validations of one license key
//! must hand it to exactly one machine.

use murmur_api::db::Db;
use murmur_api::error::AppError;
use murmur_api::models::{DeviceStatus, SubscriptionTier};
use murmur_api::services::LicenseService;
use std::sync::Arc;

mod common;

async fn setup() -> (LicenseService, Db, String) {
    let db = Db::new_memory();
    let license = LicenseService::new(db.clone());

    let device = license
        .issue_device("user-1", Some("Laptop".to_string()), None, None)
        .await
        .unwrap();
    (license, db, device.license_key)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_racing_activations_with_distinct_fingerprints_have_one_winner() {
    let (license, db, key) = setup().await;
    let license = Arc::new(license);

    let mut handles = Vec::new();
    for i in 0..8u8 {
        let license = license.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            license.validate_and_activate(&key, &common::test_fingerprint(i)).await
        }));
    }

    let mut successes = 0;
    let mut rejections = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::Forbidden(_)) => rejections += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(rejections, 7);

    let device = db.find_device_by_license_key(&key).await.unwrap().unwrap();
    assert_eq!(device.status, DeviceStatus::Active);
    assert!(device.fingerprint.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_racing_activations_with_same_fingerprint_all_succeed() {
    let (license, _db, key) = setup().await;
    let license = Arc::new(license);
    let shared = common::test_fingerprint(0xab);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let license = license.clone();
        let key = key.clone();
        let shared = shared.clone();
        handles.push(tokio::spawn(async move {
            license.validate_and_activate(&key, &shared).await
        }));
    }

    let results: Vec<_> = futures_util::future::join_all(handles).await;
    assert!(results
        .into_iter()
        .all(|r| r.unwrap().is_ok()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issuance_never_reuses_a_key() {
    let db = Db::new_memory();
    let license = Arc::new(LicenseService::new(db.clone()));

    // Enterprise tier so device limits are not the constraint here
    let profile = murmur_api::models::Profile {
        user_id: "user-1".to_string(),
        display_name: "Test".to_string(),
        email: None,
        tier: SubscriptionTier::Enterprise,
        storage_limit_mb: SubscriptionTier::Enterprise.base_storage_mb(),
        storage_bonus_mb: 0,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    db.upsert_profile(&profile).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let license = license.clone();
        handles.push(tokio::spawn(async move {
            license
                .issue_device("user-1", None, None, Some(1))
                .await
                .unwrap()
        }));
    }

    let mut keys = std::collections::HashSet::new();
    for handle in handles {
        let device = handle.await.unwrap();
        assert!(keys.insert(device.license_key), "license key reused");
    }
}
