// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Data models for the application.

pub mod device;
pub mod feedback;
pub mod profile;

pub use device::{Device, DeviceStatus};
pub use feedback::{Feedback, FeedbackStatus, FeedbackType, MAX_CORRECTION_TEXT_CHARS};
pub use profile::{Profile, SubscriptionTier};
