//! Feedback on suggested patterns and usage events.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Maximum length of free-text corrections.
pub const MAX_CORRECTION_TEXT_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum FeedbackType {
    ThumbsUp,
    ThumbsDown,
    Correction,
    Report,
}

impl FeedbackType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "thumbs_up" => Some(FeedbackType::ThumbsUp),
            "thumbs_down" => Some(FeedbackType::ThumbsDown),
            "correction" => Some(FeedbackType::Correction),
            "report" => Some(FeedbackType::Report),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::ThumbsUp => "thumbs_up",
            FeedbackType::ThumbsDown => "thumbs_down",
            FeedbackType::Correction => "correction",
            FeedbackType::Report => "report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum FeedbackStatus {
    Pending,
    Reviewed,
    Resolved,
    Dismissed,
}

impl FeedbackStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(FeedbackStatus::Pending),
            "reviewed" => Some(FeedbackStatus::Reviewed),
            "resolved" => Some(FeedbackStatus::Resolved),
            "dismissed" => Some(FeedbackStatus::Dismissed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Reviewed => "reviewed",
            FeedbackStatus::Resolved => "resolved",
            FeedbackStatus::Dismissed => "dismissed",
        }
    }
}

/// One feedback submission. Exactly one of `pattern_id` / `usage_event_id`
/// is set; a user may submit at most one feedback row per target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    /// Feedback ID (also used as document ID)
    pub id: String,
    pub user_id: String,
    pub pattern_id: Option<String>,
    pub usage_event_id: Option<String>,
    pub feedback_type: FeedbackType,
    pub correction_text: Option<String>,
    pub status: FeedbackStatus,
    pub created_at: String,
}

impl Feedback {
    /// Key identifying the target of this feedback, used for the
    /// per-(user, target) uniqueness index.
    pub fn target_key(&self) -> String {
        match (&self.pattern_id, &self.usage_event_id) {
            (Some(pattern_id), _) => format!("pattern:{}", pattern_id),
            (_, Some(event_id)) => format!("event:{}", event_id),
            (None, None) => "none".to_string(),
        }
    }
}
