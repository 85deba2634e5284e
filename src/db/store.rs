// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Store wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles (subscription tier, storage quota)
//! - Devices (license key slots)
//! - Feedback (pattern/usage-event feedback with per-target uniqueness)
//!
//! Two backends sit behind one API: hosted Firestore for production and a
//! dashmap-based in-memory store for local development and tests.
//! Uniqueness constraints (license keys, feedback targets) are expressed
//! as insert-if-absent on index collections keyed by the unique value.

use crate::error::AppError;
use crate::models::{Device, Feedback, FeedbackStatus, Profile};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Collection names.
pub mod collections {
    pub const PROFILES: &str = "profiles";
    pub const DEVICES: &str = "devices";
    /// Index: license key -> device ID. Reserving a key is an insert here.
    pub const LICENSE_KEYS: &str = "license_keys";
    pub const FEEDBACK: &str = "feedback";
    /// Index: "{user_id}_{target}" -> feedback ID, one submission per target.
    pub const FEEDBACK_TARGETS: &str = "feedback_targets";
}

/// Cursor for feedback pagination (created_at descending, ID as tiebreak).
#[derive(Debug, Clone)]
pub struct FeedbackCursor {
    pub created_at: String,
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct LicenseKeyRef {
    device_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FeedbackTargetRef {
    feedback_id: String,
}

/// In-memory backend used for local development and tests.
#[derive(Default)]
struct MemoryStore {
    profiles: DashMap<String, Profile>,
    devices: DashMap<String, Device>,
    license_keys: DashMap<String, String>,
    feedback: DashMap<String, Feedback>,
    feedback_targets: DashMap<String, String>,
}

#[derive(Clone)]
enum Backend {
    Hosted(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

/// Store client.
#[derive(Clone)]
pub struct Db {
    backend: Backend,
}

impl Db {
    /// Connect to hosted Firestore.
    pub async fn new_hosted(project_id: &str) -> Result<Self, AppError> {
        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Hosted(client),
        })
    }

    /// Create an in-memory store.
    pub fn new_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get a profile by user ID.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        match &self.backend {
            Backend::Hosted(client) => client
                .fluent()
                .select()
                .by_id_in(collections::PROFILES)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.profiles.get(user_id).map(|p| p.clone())),
        }
    }

    /// Create or update a profile.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        match &self.backend {
            Backend::Hosted(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::PROFILES)
                    .document_id(&profile.user_id)
                    .object(profile)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store
                    .profiles
                    .insert(profile.user_id.clone(), profile.clone());
                Ok(())
            }
        }
    }

    // ─── Device Operations ───────────────────────────────────────

    /// Get a device by ID.
    pub async fn get_device(&self, device_id: &str) -> Result<Option<Device>, AppError> {
        match &self.backend {
            Backend::Hosted(client) => client
                .fluent()
                .select()
                .by_id_in(collections::DEVICES)
                .obj()
                .one(device_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.devices.get(device_id).map(|d| d.clone())),
        }
    }

    /// Look up a device through the license key index.
    pub async fn find_device_by_license_key(
        &self,
        license_key: &str,
    ) -> Result<Option<Device>, AppError> {
        let device_id = match &self.backend {
            Backend::Hosted(client) => {
                let key_ref: Option<LicenseKeyRef> = client
                    .fluent()
                    .select()
                    .by_id_in(collections::LICENSE_KEYS)
                    .obj()
                    .one(license_key)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                key_ref.map(|r| r.device_id)
            }
            Backend::Memory(store) => store.license_keys.get(license_key).map(|id| id.clone()),
        };

        match device_id {
            Some(id) => self.get_device(&id).await,
            None => Ok(None),
        }
    }

    /// Reserve a license key for a device.
    ///
    /// Returns `false` when the key is already taken; the caller
    /// regenerates and retries.
    pub async fn reserve_license_key(
        &self,
        license_key: &str,
        device_id: &str,
    ) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Hosted(client) => {
                let result: Result<(), firestore::errors::FirestoreError> = client
                    .fluent()
                    .insert()
                    .into(collections::LICENSE_KEYS)
                    .document_id(license_key)
                    .object(&LicenseKeyRef {
                        device_id: device_id.to_string(),
                    })
                    .execute()
                    .await;
                match result {
                    Ok(()) => Ok(true),
                    Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
                    Err(e) => Err(AppError::Database(e.to_string())),
                }
            }
            Backend::Memory(store) => {
                use dashmap::mapref::entry::Entry;
                match store.license_keys.entry(license_key.to_string()) {
                    Entry::Occupied(_) => Ok(false),
                    Entry::Vacant(slot) => {
                        slot.insert(device_id.to_string());
                        Ok(true)
                    }
                }
            }
        }
    }

    /// Release a reserved license key so it can be handed out again.
    pub async fn release_license_key(&self, license_key: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Hosted(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collections::LICENSE_KEYS)
                    .document_id(license_key)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.license_keys.remove(license_key);
                Ok(())
            }
        }
    }

    /// Store a new device. Its license key must be reserved first.
    pub async fn insert_device(&self, device: &Device) -> Result<(), AppError> {
        self.write_device(device).await
    }

    /// Update an existing device.
    pub async fn update_device(&self, device: &Device) -> Result<(), AppError> {
        self.write_device(device).await
    }

    async fn write_device(&self, device: &Device) -> Result<(), AppError> {
        match &self.backend {
            Backend::Hosted(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::DEVICES)
                    .document_id(&device.id)
                    .object(device)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.devices.insert(device.id.clone(), device.clone());
                Ok(())
            }
        }
    }

    /// Delete a device and free its license key.
    pub async fn delete_device(&self, device: &Device) -> Result<(), AppError> {
        match &self.backend {
            Backend::Hosted(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collections::DEVICES)
                    .document_id(&device.id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => {
                store.devices.remove(&device.id);
            }
        }
        self.release_license_key(&device.license_key).await
    }

    /// Get all devices owned by a user, newest first.
    pub async fn list_devices_for_user(&self, user_id: &str) -> Result<Vec<Device>, AppError> {
        match &self.backend {
            Backend::Hosted(client) => {
                let owner = user_id.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::DEVICES)
                    .filter(move |q| q.for_all([q.field("user_id").eq(owner.clone())]))
                    .order_by([(
                        "created_at",
                        firestore::FirestoreQueryDirection::Descending,
                    )])
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            Backend::Memory(store) => {
                let mut devices: Vec<Device> = store
                    .devices
                    .iter()
                    .filter(|entry| entry.value().user_id == user_id)
                    .map(|entry| entry.value().clone())
                    .collect();
                devices.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| b.id.cmp(&a.id))
                });
                Ok(devices)
            }
        }
    }

    // ─── Feedback Operations ─────────────────────────────────────

    /// Store a feedback submission.
    ///
    /// The per-(user, target) uniqueness index is written first with
    /// insert-if-absent semantics; a duplicate maps to a conflict and
    /// nothing is stored.
    pub async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), AppError> {
        let target_id = format!("{}_{}", feedback.user_id, feedback.target_key());

        let reserved = match &self.backend {
            Backend::Hosted(client) => {
                let result: Result<(), firestore::errors::FirestoreError> = client
                    .fluent()
                    .insert()
                    .into(collections::FEEDBACK_TARGETS)
                    .document_id(&target_id)
                    .object(&FeedbackTargetRef {
                        feedback_id: feedback.id.clone(),
                    })
                    .execute()
                    .await;
                match result {
                    Ok(()) => true,
                    Err(firestore::errors::FirestoreError::DataConflictError(_)) => false,
                    Err(e) => return Err(AppError::Database(e.to_string())),
                }
            }
            Backend::Memory(store) => {
                use dashmap::mapref::entry::Entry;
                match store.feedback_targets.entry(target_id) {
                    Entry::Occupied(_) => false,
                    Entry::Vacant(slot) => {
                        slot.insert(feedback.id.clone());
                        true
                    }
                }
            }
        };

        if !reserved {
            return Err(AppError::Conflict(
                "feedback already submitted for this target".to_string(),
            ));
        }

        match &self.backend {
            Backend::Hosted(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::FEEDBACK)
                    .document_id(&feedback.id)
                    .object(feedback)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.feedback.insert(feedback.id.clone(), feedback.clone());
                Ok(())
            }
        }
    }

    /// Get feedback for a user with optional status filter and cursor
    /// pagination, newest first.
    pub async fn list_feedback_for_user(
        &self,
        user_id: &str,
        status: Option<FeedbackStatus>,
        cursor: Option<&FeedbackCursor>,
        limit: u32,
    ) -> Result<Vec<Feedback>, AppError> {
        match &self.backend {
            Backend::Hosted(client) => {
                let owner = user_id.to_string();
                let status_str: Option<&'static str> = status.map(|s| s.as_str());
                let before: Option<FeedbackCursor> = cursor.cloned();

                client
                    .fluent()
                    .select()
                    .from(collections::FEEDBACK)
                    .filter(move |q| {
                        q.for_all([
                            q.field("user_id").eq(owner.clone()),
                            status_str.and_then(|s| q.field("status").eq(s)),
                            // Tuple-less-than on (created_at, id): rows
                            // sharing the cursor's timestamp fall back to
                            // the id tiebreak, matching the sort order.
                            before.as_ref().and_then(|c| {
                                q.for_any([
                                    q.field("created_at").less_than(c.created_at.clone()),
                                    q.for_all([
                                        q.field("created_at").eq(c.created_at.clone()),
                                        q.field("id").less_than(c.id.clone()),
                                    ]),
                                ])
                            }),
                        ])
                    })
                    .order_by([
                        (
                            "created_at",
                            firestore::FirestoreQueryDirection::Descending,
                        ),
                        ("id", firestore::FirestoreQueryDirection::Descending),
                    ])
                    .limit(limit)
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            Backend::Memory(store) => {
                let mut items: Vec<Feedback> = store
                    .feedback
                    .iter()
                    .filter(|entry| {
                        let f = entry.value();
                        f.user_id == user_id && status.map_or(true, |s| f.status == s)
                    })
                    .map(|entry| entry.value().clone())
                    .collect();
                items.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| b.id.cmp(&a.id))
                });
                if let Some(cursor) = cursor {
                    items.retain(|f| {
                        (f.created_at.as_str(), f.id.as_str())
                            < (cursor.created_at.as_str(), cursor.id.as_str())
                    });
                }
                items.truncate(limit as usize);
                Ok(items)
            }
        }
    }
}
