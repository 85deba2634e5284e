// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Storage quota calculations.
//!
//! Total quota is the tier's base storage plus the user's invitation
//! bonus, capped per tier. Usage is the sum of the user's device
//! allocations; an allocation request is a linear sum-and-compare.

use crate::error::AppError;
use crate::models::{Device, Profile};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Storage quota snapshot for one user.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StorageStats {
    pub used_mb: u64,
    pub base_mb: u64,
    /// Bonus after the tier cap is applied
    pub bonus_mb: u64,
    pub total_mb: u64,
    pub percentage_used: f64,
}

/// Compute storage stats from a profile and its devices.
pub fn storage_stats(profile: &Profile, devices: &[Device]) -> StorageStats {
    let used_mb: u64 = devices.iter().map(|d| d.storage_allocation_mb).sum();
    let base_mb = profile.storage_limit_mb;
    let bonus_mb = profile.storage_bonus_mb.min(profile.tier.bonus_cap_mb());
    let total_mb = base_mb + bonus_mb;
    let percentage_used = if total_mb > 0 {
        (used_mb as f64 / total_mb as f64) * 100.0
    } else {
        0.0
    };

    StorageStats {
        used_mb,
        base_mb,
        bonus_mb,
        total_mb,
        percentage_used,
    }
}

/// Total storage quota in MB (base + capped bonus).
pub fn total_storage_mb(profile: &Profile) -> u64 {
    profile.storage_limit_mb + profile.storage_bonus_mb.min(profile.tier.bonus_cap_mb())
}

/// Check whether `requested_mb` more storage can be allocated.
pub fn check_allocation(
    profile: &Profile,
    devices: &[Device],
    requested_mb: u64,
) -> Result<(), AppError> {
    let stats = storage_stats(profile, devices);
    // An addition that overflows reads as over-quota, never as a wrap.
    let within = stats
        .used_mb
        .checked_add(requested_mb)
        .is_some_and(|total| total <= stats.total_mb);
    if !within {
        return Err(AppError::Forbidden(format!(
            "storage quota exceeded: {} MB requested with {} of {} MB already allocated; upgrade your plan for more storage",
            requested_mb, stats.used_mb, stats.total_mb
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceStatus, SubscriptionTier};

    fn profile(tier: SubscriptionTier, bonus_mb: u64) -> Profile {
        Profile {
            user_id: "user-1".to_string(),
            display_name: "Test".to_string(),
            email: None,
            tier,
            storage_limit_mb: tier.base_storage_mb(),
            storage_bonus_mb: bonus_mb,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn device(allocation_mb: u64) -> Device {
        Device {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "user-1".to_string(),
            name: "Test device".to_string(),
            device_type: "desktop".to_string(),
            license_key: "KEY".to_string(),
            status: DeviceStatus::Active,
            fingerprint: None,
            storage_allocation_mb: allocation_mb,
            created_at: chrono::Utc::now().to_rfc3339(),
            activated_at: None,
            last_validated_at: None,
        }
    }

    #[test]
    fn test_stats_with_no_bonus() {
        let stats = storage_stats(&profile(SubscriptionTier::Pro, 0), &[]);

        assert_eq!(stats.used_mb, 0);
        assert_eq!(stats.base_mb, 2000);
        assert_eq!(stats.bonus_mb, 0);
        assert_eq!(stats.total_mb, 2000);
        assert_eq!(stats.percentage_used, 0.0);
    }

    #[test]
    fn test_stats_with_bonus_under_cap() {
        let stats = storage_stats(&profile(SubscriptionTier::Pro, 200), &[]);

        assert_eq!(stats.bonus_mb, 200);
        assert_eq!(stats.total_mb, 2200);
    }

    #[test]
    fn test_stats_with_bonus_exceeding_cap() {
        let stats = storage_stats(&profile(SubscriptionTier::Pro, 1500), &[]);

        // Pro bonus is capped at 1000 MB
        assert_eq!(stats.bonus_mb, 1000);
        assert_eq!(stats.total_mb, 3000);
    }

    #[test]
    fn test_free_tier_gets_no_bonus() {
        let stats = storage_stats(&profile(SubscriptionTier::Free, 500), &[]);

        assert_eq!(stats.bonus_mb, 0);
        assert_eq!(stats.total_mb, 100);
    }

    #[test]
    fn test_usage_sums_device_allocations() {
        let devices = vec![device(30), device(20)];
        let stats = storage_stats(&profile(SubscriptionTier::Free, 0), &devices);

        assert_eq!(stats.used_mb, 50);
        assert_eq!(stats.percentage_used, 50.0);
    }

    #[test]
    fn test_check_allocation_within_quota() {
        let devices = vec![device(30)];
        assert!(check_allocation(&profile(SubscriptionTier::Free, 0), &devices, 50).is_ok());
    }

    #[test]
    fn test_check_allocation_exceeding_quota() {
        let devices = vec![device(60)];
        let err = check_allocation(&profile(SubscriptionTier::Free, 0), &devices, 50).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_check_allocation_with_huge_request_does_not_overflow() {
        let devices = vec![device(25)];
        let err =
            check_allocation(&profile(SubscriptionTier::Free, 0), &devices, u64::MAX).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
