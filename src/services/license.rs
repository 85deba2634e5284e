// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! License key issuance and activation.
//!
//! Keys are 24 characters drawn from a 32-character class with the
//! ambiguous glyphs (I, O, 0, 1) removed, formatted as six dash-separated
//! groups of four.
//!
//! Activation binds a key to a client-computed device fingerprint.
//! Concurrent activations of the same key are serialized through a
//! per-key async lock, and re-activation with the stored fingerprint is
//! idempotent, so duplicate or racing calls never hand one key to two
//! machines.

use crate::db::Db;
use crate::error::AppError;
use crate::models::{Device, DeviceStatus, Profile};
use crate::services::quota;
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

/// Characters in a license key, not counting group separators.
pub const LICENSE_KEY_CHARS: usize = 24;

/// Key alphabet: uppercase alphanumerics minus I, O, 0 and 1.
/// Exactly 32 entries so a masked random byte indexes it without bias.
pub const KEY_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const KEY_GROUP: usize = 4;
const MAX_KEY_ATTEMPTS: usize = 5;
const FINGERPRINT_HEX_CHARS: usize = 64;

/// Storage reserved for a device when the client does not ask for a
/// specific allocation.
pub const DEFAULT_DEVICE_ALLOCATION_MB: u64 = 25;

/// Per-key locks serializing concurrent activations of one license key.
type ActivationLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Result of a successful license validation.
#[derive(Debug)]
pub struct Activation {
    pub device: Device,
    pub profile: Profile,
    /// True when the device was already active with this fingerprint.
    pub reactivated: bool,
}

/// License key issuance and activation service.
#[derive(Clone)]
pub struct LicenseService {
    db: Db,
    activation_locks: ActivationLocks,
}

impl LicenseService {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            activation_locks: Arc::new(DashMap::new()),
        }
    }

    /// Generate a random license key.
    pub fn generate_license_key() -> Result<String, AppError> {
        let rng = SystemRandom::new();
        let mut bytes = [0u8; LICENSE_KEY_CHARS];
        rng.fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failure")))?;

        let mut key = String::with_capacity(LICENSE_KEY_CHARS + LICENSE_KEY_CHARS / KEY_GROUP);
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 && i % KEY_GROUP == 0 {
                key.push('-');
            }
            key.push(KEY_ALPHABET[(byte & 0x1f) as usize] as char);
        }
        Ok(key)
    }

    /// Register a new device for a user and issue its license key.
    ///
    /// Enforces the tier device limit and the storage quota before any
    /// write. Key collisions are retried against the reservation index.
    pub async fn issue_device(
        &self,
        user_id: &str,
        name: Option<String>,
        device_type: Option<String>,
        storage_allocation_mb: Option<u64>,
    ) -> Result<Device, AppError> {
        let profile = self
            .db
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| Profile::default_free(user_id));
        let devices = self.db.list_devices_for_user(user_id).await?;

        let limit = profile.tier.device_limit();
        if devices.len() as u32 >= limit {
            return Err(AppError::Forbidden(format!(
                "device limit reached for the {} tier ({} of {}); upgrade your plan to register more devices",
                profile.tier.as_str(),
                devices.len(),
                limit
            )));
        }

        let requested_mb = storage_allocation_mb.unwrap_or(DEFAULT_DEVICE_ALLOCATION_MB);
        quota::check_allocation(&profile, &devices, requested_mb)?;

        let device_id = uuid::Uuid::new_v4().to_string();

        let mut license_key = None;
        for attempt in 0..MAX_KEY_ATTEMPTS {
            let candidate = Self::generate_license_key()?;
            if self.db.reserve_license_key(&candidate, &device_id).await? {
                license_key = Some(candidate);
                break;
            }
            tracing::warn!(attempt, "License key collision, regenerating");
        }
        let license_key = license_key.ok_or_else(|| {
            AppError::Conflict("could not allocate a unique license key".to_string())
        })?;

        let device = Device {
            id: device_id,
            user_id: user_id.to_string(),
            name: name.unwrap_or_else(|| "New device".to_string()),
            device_type: device_type.unwrap_or_else(|| "desktop".to_string()),
            license_key,
            status: DeviceStatus::Pending,
            fingerprint: None,
            storage_allocation_mb: requested_mb,
            created_at: chrono::Utc::now().to_rfc3339(),
            activated_at: None,
            last_validated_at: None,
        };
        if let Err(err) = self.db.insert_device(&device).await {
            // Do not orphan the reservation; the key was never handed out.
            if let Err(release_err) = self.db.release_license_key(&device.license_key).await {
                tracing::error!(
                    error = %release_err,
                    "Failed to release license key after device insert error"
                );
            }
            return Err(err);
        }

        tracing::info!(
            user_id,
            device_id = %device.id,
            tier = profile.tier.as_str(),
            "Device registered with new license key"
        );

        Ok(device)
    }

    /// Validate a license key against a device fingerprint, activating the
    /// device on first use.
    ///
    /// - unknown key: not found
    /// - pending device: activates, binding the fingerprint
    /// - active device, same fingerprint: idempotent success; only
    ///   `last_validated_at` is refreshed
    /// - active device, different fingerprint: rejected
    /// - revoked device: rejected
    pub async fn validate_and_activate(
        &self,
        license_key: &str,
        fingerprint: &str,
    ) -> Result<Activation, AppError> {
        let license_key = license_key.trim();
        if license_key.is_empty() {
            return Err(AppError::BadRequest(
                "license_key must not be empty".to_string(),
            ));
        }

        let fingerprint = fingerprint.trim().to_ascii_lowercase();
        if !is_valid_fingerprint(&fingerprint) {
            return Err(AppError::BadRequest(
                "device_fingerprint must be a 64-character hex string".to_string(),
            ));
        }

        // The endpoint is public, so unknown keys must never touch the
        // lock map; otherwise guessed keys grow it without bound. The
        // authoritative read happens again under the lock.
        if self
            .db
            .find_device_by_license_key(license_key)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("license key not found".to_string()));
        }

        // Serialize activations of this key
        let lock = self
            .activation_locks
            .entry(license_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;
        let result = self.activate_locked(license_key, &fingerprint).await;
        drop(guard);
        drop(lock);
        // Drop the entry once no other caller holds a clone.
        self.activation_locks
            .remove_if(license_key, |_, l| Arc::strong_count(l) == 1);

        result
    }

    async fn activate_locked(
        &self,
        license_key: &str,
        fingerprint: &str,
    ) -> Result<Activation, AppError> {
        let mut device = self
            .db
            .find_device_by_license_key(license_key)
            .await?
            .ok_or_else(|| AppError::NotFound("license key not found".to_string()))?;

        let now = chrono::Utc::now().to_rfc3339();
        let reactivated = match device.status {
            DeviceStatus::Revoked => {
                return Err(AppError::Forbidden(
                    "license key has been revoked".to_string(),
                ));
            }
            DeviceStatus::Active => {
                let stored = device.fingerprint.as_deref().unwrap_or("");
                if !fingerprints_match(stored, fingerprint) {
                    tracing::warn!(
                        device_id = %device.id,
                        "License validation rejected: fingerprint mismatch"
                    );
                    return Err(AppError::Forbidden(
                        "license key is already activated on another device".to_string(),
                    ));
                }
                device.last_validated_at = Some(now);
                true
            }
            DeviceStatus::Pending => {
                device.status = DeviceStatus::Active;
                device.fingerprint = Some(fingerprint.to_string());
                device.activated_at = Some(now.clone());
                device.last_validated_at = Some(now);
                false
            }
        };

        self.db.update_device(&device).await?;

        let profile = self
            .db
            .get_profile(&device.user_id)
            .await?
            .unwrap_or_else(|| Profile::default_free(&device.user_id));

        tracing::info!(device_id = %device.id, reactivated, "License validated");

        Ok(Activation {
            device,
            profile,
            reactivated,
        })
    }
}

fn is_valid_fingerprint(fingerprint: &str) -> bool {
    fingerprint.len() == FINGERPRINT_HEX_CHARS && hex::decode(fingerprint).is_ok()
}

/// Constant-time fingerprint comparison.
fn fingerprints_match(stored: &str, provided: &str) -> bool {
    stored.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_uses_only_alphabet_chars() {
        let key = LicenseService::generate_license_key().unwrap();
        let chars: Vec<char> = key.chars().filter(|c| *c != '-').collect();

        assert_eq!(chars.len(), LICENSE_KEY_CHARS);
        for c in chars {
            assert!(
                KEY_ALPHABET.contains(&(c as u8)),
                "unexpected key char: {}",
                c
            );
        }
    }

    #[test]
    fn test_key_grouping() {
        let key = LicenseService::generate_license_key().unwrap();
        let groups: Vec<&str> = key.split('-').collect();

        assert_eq!(groups.len(), LICENSE_KEY_CHARS / 4);
        assert!(groups.iter().all(|g| g.len() == 4));
    }

    #[test]
    fn test_keys_are_not_repeated() {
        let a = LicenseService::generate_license_key().unwrap();
        let b = LicenseService::generate_license_key().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_validation() {
        let valid = "a".repeat(64);
        assert!(is_valid_fingerprint(&valid));
        assert!(!is_valid_fingerprint("abc"));
        assert!(!is_valid_fingerprint(&"g".repeat(64)));
        assert!(!is_valid_fingerprint(&"a".repeat(63)));
    }

    #[test]
    fn test_fingerprints_match_is_exact() {
        let fp = "ab".repeat(32);
        assert!(fingerprints_match(&fp, &fp));
        assert!(!fingerprints_match(&fp, &"ba".repeat(32)));
        assert!(!fingerprints_match("", &fp));
    }

    #[tokio::test]
    async fn test_unknown_keys_do_not_accumulate_locks() {
        let service = LicenseService::new(Db::new_memory());
        let fingerprint = "ab".repeat(32);

        // Guessed keys on the public endpoint must leave no trace
        for i in 0..20 {
            let err = service
                .validate_and_activate(&format!("AAAA-BBBB-CCCC-DDDD-EEEE-{:04}", i), &fingerprint)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }

        assert!(service.activation_locks.is_empty());
    }

    #[tokio::test]
    async fn test_activation_lock_is_dropped_after_use() {
        let service = LicenseService::new(Db::new_memory());
        let device = service
            .issue_device("user-1", None, None, None)
            .await
            .unwrap();

        service
            .validate_and_activate(&device.license_key, &"ab".repeat(32))
            .await
            .unwrap();

        assert!(service.activation_locks.is_empty());
    }
}
