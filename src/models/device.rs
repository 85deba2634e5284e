//! Device model: one license-key activation slot per device.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Device activation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DeviceStatus {
    Pending,
    Active,
    Revoked,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Pending => "pending",
            DeviceStatus::Active => "active",
            DeviceStatus::Revoked => "revoked",
        }
    }
}

/// Registered device.
///
/// `fingerprint` is set on first activation and never changes afterwards;
/// re-activation is only allowed when the caller presents the same value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Device ID (also used as document ID)
    pub id: String,
    /// Owning user
    pub user_id: String,
    pub name: String,
    /// Client kind ("desktop", "vscode", ...)
    pub device_type: String,
    /// Opaque license key, unique across all devices
    pub license_key: String,
    pub status: DeviceStatus,
    /// Client-computed hardware hash, immutable after first activation
    pub fingerprint: Option<String>,
    /// Portion of the user's storage quota reserved for this device
    pub storage_allocation_mb: u64,
    pub created_at: String,
    pub activated_at: Option<String>,
    pub last_validated_at: Option<String>,
}
