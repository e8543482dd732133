use chrono::{DateTime, NaiveDate, Utc};
use common::detail::{Attachment, DetailFields};
use common::{AchievementStatus, DetailPatch, NewDetail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{double_option, validate_title};
use crate::error::AppError;
use crate::lifecycle::AchievementView;

fn validate_kind(kind: &str) -> Result<(), AppError> {
    let kind = kind.trim();
    if kind.is_empty() || kind.chars().count() > 64 {
        return Err(AppError::Validation("Type must be 1-64 characters".into()));
    }
    Ok(())
}

fn validate_points(points: i32) -> Result<(), AppError> {
    if points < 0 {
        return Err(AppError::Validation("Points must not be negative".into()));
    }
    Ok(())
}

/// All date-shaped detail fields must be `YYYY-MM-DD`.
fn validate_event_date(date: &str) -> Result<(), AppError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        AppError::Validation("details.eventDate must be formatted YYYY-MM-DD".into())
    })?;
    Ok(())
}

/// Request body for creating an achievement.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAchievementRequest {
    /// Free-text category.
    #[serde(rename = "type")]
    #[schema(example = "competition")]
    pub kind: String,
    #[schema(example = "Regional Coding 2025")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub points: Option<i32>,
    #[serde(default)]
    pub details: DetailFields,
    /// Admin-only: the student profile this achievement is recorded for.
    /// Students always record against their own profile.
    #[serde(default)]
    pub target_student_id: Option<Uuid>,
}

pub fn validate_create_achievement(payload: &CreateAchievementRequest) -> Result<(), AppError> {
    validate_kind(&payload.kind)?;
    validate_title(&payload.title)?;
    if let Some(points) = payload.points {
        validate_points(points)?;
    }
    match payload.details.event_date.as_deref() {
        Some(date) => validate_event_date(date)?,
        None => {
            return Err(AppError::Validation(
                "details.eventDate is required".into(),
            ));
        }
    }
    Ok(())
}

impl CreateAchievementRequest {
    /// Detail content for the coordinator; the caller has already resolved
    /// the target student.
    pub fn into_content(self, student_id: Uuid) -> NewDetail {
        NewDetail {
            student_id,
            kind: self.kind.trim().to_string(),
            title: self.title.trim().to_string(),
            description: self.description,
            tags: self.tags,
            points: self.points,
            details: self.details,
        }
    }
}

/// Request body for editing a draft achievement. Absent fields stay
/// untouched; `description` and `points` accept explicit nulls.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAchievementRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub points: Option<Option<i32>>,
    /// Replaces the whole `details` object when present.
    pub details: Option<DetailFields>,
}

pub fn validate_update_achievement(payload: &UpdateAchievementRequest) -> Result<(), AppError> {
    if let Some(kind) = &payload.kind {
        validate_kind(kind)?;
    }
    if let Some(title) = &payload.title {
        validate_title(title)?;
    }
    if let Some(Some(points)) = payload.points {
        validate_points(points)?;
    }
    if let Some(details) = &payload.details
        && let Some(date) = details.event_date.as_deref()
    {
        validate_event_date(date)?;
    }

    if payload.is_empty() {
        return Err(AppError::Validation("No fields to update".into()));
    }
    Ok(())
}

impl UpdateAchievementRequest {
    fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.points.is_none()
            && self.details.is_none()
    }

    pub fn into_patch(self) -> DetailPatch {
        DetailPatch {
            kind: self.kind.map(|k| k.trim().to_string()),
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            tags: self.tags,
            points: self.points,
            details: self.details,
        }
    }
}

/// Request body for rejecting a submitted achievement.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    /// Why the achievement was rejected. Required and non-empty.
    #[schema(example = "Certificate scan is unreadable")]
    pub rejection_note: String,
}

pub fn validate_reject(payload: &RejectRequest) -> Result<(), AppError> {
    if payload.rejection_note.trim().is_empty() {
        return Err(AppError::Validation(
            "rejectionNote must not be empty".into(),
        ));
    }
    Ok(())
}

/// Metadata of one uploaded attachment, echoed back after upload.
pub type AttachmentBody = Attachment;

/// An achievement as returned by read paths: the reference joined with its
/// detail document. Timestamps that were never stamped serialize as null.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AchievementResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub status: AchievementStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub rejection_note: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub points: Option<i32>,
    pub attachments: Vec<AttachmentBody>,
    pub details: DetailFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AchievementView> for AchievementResponse {
    fn from(view: AchievementView) -> Self {
        let AchievementView { reference, detail } = view;
        Self {
            id: reference.id,
            student_id: reference.student_id,
            status: reference.status,
            submitted_at: reference.submitted_at,
            verified_at: reference.verified_at,
            verified_by: reference.verified_by,
            rejection_note: reference.rejection_note,
            kind: detail.kind,
            title: detail.title,
            description: detail.description,
            tags: detail.tags,
            points: detail.points,
            attachments: detail.attachments,
            details: detail.details,
            created_at: reference.created_at,
            updated_at: reference.updated_at,
        }
    }
}

/// List response for achievements.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AchievementListResponse {
    pub data: Vec<AchievementResponse>,
    #[schema(example = 3)]
    pub total: usize,
}
