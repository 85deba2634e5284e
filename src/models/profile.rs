//! User profile and subscription tiers.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Subscription tier, gating device count and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SubscriptionTier {
    Free,
    Network,
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    /// Maximum number of registered devices for this tier.
    pub fn device_limit(&self) -> u32 {
        match self {
            SubscriptionTier::Free => 3,
            SubscriptionTier::Network => 5,
            SubscriptionTier::Pro => 10,
            SubscriptionTier::Enterprise => 999,
        }
    }

    /// Base storage in MB, before any invitation bonus.
    pub fn base_storage_mb(&self) -> u64 {
        match self {
            SubscriptionTier::Free => 100,
            SubscriptionTier::Network => 500,
            SubscriptionTier::Pro => 2000,
            SubscriptionTier::Enterprise => 10000,
        }
    }

    /// Cap on accumulated bonus storage in MB.
    pub fn bonus_cap_mb(&self) -> u64 {
        match self {
            SubscriptionTier::Free => 0,
            SubscriptionTier::Network => 250,
            SubscriptionTier::Pro => 1000,
            SubscriptionTier::Enterprise => 10000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Network => "network",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }
}

/// User profile. Created by the sign-up flow; read-only through this API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// User ID (also used as document ID)
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub tier: SubscriptionTier,
    /// Base storage in MB
    pub storage_limit_mb: u64,
    /// Accumulated bonus storage in MB (capped per tier when applied)
    pub storage_bonus_mb: u64,
    pub created_at: String,
}

impl Profile {
    /// Default free-tier profile for users whose profile row does not
    /// exist yet (sign-up writes it asynchronously).
    pub fn default_free(user_id: &str) -> Self {
        let tier = SubscriptionTier::Free;
        Self {
            user_id: user_id.to_string(),
            display_name: String::new(),
            email: None,
            tier,
            storage_limit_mb: tier.base_storage_mb(),
            storage_bonus_mb: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
