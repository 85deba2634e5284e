// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Feedback routes: submissions on suggested patterns and usage events.

use crate::db::FeedbackCursor;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Feedback, FeedbackStatus, FeedbackType, MAX_CORRECTION_TEXT_CHARS};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Feedback routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/feedback", get(list_feedback).post(create_feedback))
}

// ─── Pagination ──────────────────────────────────────────────

fn default_per_page() -> u32 {
    50
}

const MAX_PER_PAGE: u32 = 100;

fn parse_cursor(cursor: Option<&str>) -> Result<Option<FeedbackCursor>> {
    cursor
        .map(|raw| {
            let invalid_cursor =
                || AppError::BadRequest("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            let (created_at, id) = decoded_str.split_once('|').ok_or_else(invalid_cursor)?;
            if id.is_empty() || chrono::DateTime::parse_from_rfc3339(created_at).is_err() {
                return Err(invalid_cursor());
            }

            Ok(FeedbackCursor {
                created_at: created_at.to_string(),
                id: id.to_string(),
            })
        })
        .transpose()
}

fn encode_cursor(feedback: &Feedback) -> String {
    URL_SAFE_NO_PAD.encode(format!("{}|{}", feedback.created_at, feedback.id))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct FeedbackQuery {
    /// Filter by status
    status: Option<String>,
    /// Cursor for forward pagination (opaque token)
    cursor: Option<String>,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedbackResponse {
    pub id: String,
    pub pattern_id: Option<String>,
    pub usage_event_id: Option<String>,
    pub feedback_type: String,
    pub correction_text: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<&Feedback> for FeedbackResponse {
    fn from(feedback: &Feedback) -> Self {
        Self {
            id: feedback.id.clone(),
            pattern_id: feedback.pattern_id.clone(),
            usage_event_id: feedback.usage_event_id.clone(),
            feedback_type: feedback.feedback_type.as_str().to_string(),
            correction_text: feedback.correction_text.clone(),
            status: feedback.status.as_str().to_string(),
            created_at: feedback.created_at.clone(),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedbackListResponse {
    pub feedback: Vec<FeedbackResponse>,
    pub per_page: u32,
    pub next_cursor: Option<String>,
}

/// Get the caller's feedback with optional status filter.
async fn list_feedback(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<FeedbackQuery>,
) -> Result<Json<FeedbackListResponse>> {
    let status = params
        .status
        .as_deref()
        .map(|raw| {
            FeedbackStatus::parse(raw).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "invalid status '{}'; expected pending, reviewed, resolved or dismissed",
                    raw
                ))
            })
        })
        .transpose()?;
    let cursor = parse_cursor(params.cursor.as_deref())?;
    let limit = params.per_page.clamp(1, MAX_PER_PAGE);

    tracing::debug!(
        user_id = %user.user_id,
        status = ?status,
        cursor = ?params.cursor,
        "Fetching feedback"
    );

    // Fetch one extra item to determine if another page is available.
    let mut results = state
        .db
        .list_feedback_for_user(&user.user_id, status, cursor.as_ref(), limit + 1)
        .await?;

    let has_more = results.len() > limit as usize;
    if has_more {
        results.truncate(limit as usize);
    }
    let next_cursor = if has_more {
        results.last().map(encode_cursor)
    } else {
        None
    };

    Ok(Json(FeedbackListResponse {
        feedback: results.iter().map(FeedbackResponse::from).collect(),
        per_page: limit,
        next_cursor,
    }))
}

// ─── Submission ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CreateFeedbackRequest {
    feedback_type: Option<String>,
    pattern_id: Option<String>,
    usage_event_id: Option<String>,
    #[validate(length(max = 1000))]
    correction_text: Option<String>,
}

/// Submit feedback on a pattern or usage event.
async fn create_feedback(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>)> {
    // All validation happens before any store write.
    req.validate().map_err(|_| {
        AppError::BadRequest(format!(
            "correction_text must be at most {} characters",
            MAX_CORRECTION_TEXT_CHARS
        ))
    })?;

    let feedback_type = req
        .feedback_type
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("feedback_type is required".to_string()))
        .and_then(|raw| {
            FeedbackType::parse(raw).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "invalid feedback_type '{}'; expected thumbs_up, thumbs_down, correction or report",
                    raw
                ))
            })
        })?;

    let (pattern_id, usage_event_id) = match (req.pattern_id, req.usage_event_id) {
        (Some(p), None) if !p.is_empty() => (Some(p), None),
        (None, Some(e)) if !e.is_empty() => (None, Some(e)),
        _ => {
            return Err(AppError::BadRequest(
                "exactly one of pattern_id or usage_event_id is required".to_string(),
            ));
        }
    };

    let feedback = Feedback {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id.clone(),
        pattern_id,
        usage_event_id,
        feedback_type,
        correction_text: req.correction_text,
        status: FeedbackStatus::Pending,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state.db.insert_feedback(&feedback).await?;

    tracing::info!(
        user_id = %user.user_id,
        feedback_id = %feedback.id,
        feedback_type = feedback_type.as_str(),
        "Feedback submitted"
    );

    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(&feedback))))
}
