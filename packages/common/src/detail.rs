use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single uploaded file attached to an achievement.
/// Stored inside the detail document's `attachments` array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Original file name as uploaded (e.g., "certificate.pdf").
    pub file_name: String,
    /// Where the stored file can be fetched from.
    pub file_url: String,
    /// MIME type of the file.
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// The open-ended `details` object of an achievement document.
///
/// The recognized fields below cover the achievement categories the system
/// knows about (competitions, publications, organizations, certifications and
/// generic events); anything else goes through `custom_fields` so new
/// categories never require a schema change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailFields {
    // Competition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medal: Option<String>,

    // Publication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    // Organization membership
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,

    // Certification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,

    // Generic event metadata
    /// Date the achievement took place, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Escape hatch for fields the schema does not enumerate.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

/// The content document of an achievement, one per reference.
///
/// `student_id` is denormalized from the reference for integrity checks and
/// document-side filtering; the two must always agree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDetail {
    /// Opaque document id; the reference row points at it via `detail_id`.
    pub id: String,
    pub student_id: uuid::Uuid,
    /// Free-text category (e.g., competition, publication, certification).
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i32>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub details: DetailFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AchievementDetail {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Content for a new detail document. The store assigns the id and stamps
/// the timestamps.
#[derive(Clone, Debug)]
pub struct NewDetail {
    pub student_id: uuid::Uuid,
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub points: Option<i32>,
    pub details: DetailFields,
}

/// Shallow overwrite of the editable detail fields.
///
/// Only the field set below may be replaced after creation; `None` leaves a
/// field untouched. Timestamps, attachments and the soft-delete marker are
/// never writable through a patch.
#[derive(Clone, Debug, Default)]
pub struct DetailPatch {
    pub kind: Option<String>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub points: Option<Option<i32>>,
    pub details: Option<DetailFields>,
}

impl DetailPatch {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.points.is_none()
            && self.details.is_none()
    }

    /// Apply the patch to a document in place. Does not touch `created_at`,
    /// `attachments` or `deleted_at`; the caller stamps `updated_at`.
    pub fn apply(self, detail: &mut AchievementDetail) {
        if let Some(kind) = self.kind {
            detail.kind = kind;
        }
        if let Some(title) = self.title {
            detail.title = title;
        }
        if let Some(description) = self.description {
            detail.description = description;
        }
        if let Some(tags) = self.tags {
            detail.tags = tags;
        }
        if let Some(points) = self.points {
            detail.points = points;
        }
        if let Some(details) = self.details {
            detail.details = details;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_detail() -> AchievementDetail {
        AchievementDetail {
            id: "doc-1".into(),
            student_id: uuid::Uuid::new_v4(),
            kind: "competition".into(),
            title: "Regional Coding 2025".into(),
            description: None,
            tags: vec!["coding".into()],
            points: Some(10),
            attachments: vec![],
            details: DetailFields {
                event_date: Some("2025-09-01".into()),
                competition_level: Some("regional".into()),
                rank: Some(1),
                ..Default::default()
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_patch_overwrites_only_given_fields() {
        let mut detail = sample_detail();
        let created = detail.created_at;

        DetailPatch {
            title: Some("Regional Coding 2025 (revised)".into()),
            points: Some(None),
            ..Default::default()
        }
        .apply(&mut detail);

        assert_eq!(detail.title, "Regional Coding 2025 (revised)");
        assert_eq!(detail.points, None);
        assert_eq!(detail.kind, "competition");
        assert_eq!(detail.tags, vec!["coding".to_string()]);
        assert_eq!(detail.created_at, created);
        assert!(detail.deleted_at.is_none());
    }

    #[test]
    fn test_patch_replaces_details_wholesale() {
        let mut detail = sample_detail();

        DetailPatch {
            details: Some(DetailFields {
                event_date: Some("2025-10-01".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
        .apply(&mut detail);

        assert_eq!(detail.details.event_date.as_deref(), Some("2025-10-01"));
        // Shallow overwrite: the old competition fields are gone.
        assert_eq!(detail.details.competition_level, None);
        assert_eq!(detail.details.rank, None);
    }

    #[test]
    fn test_document_wire_shape_is_camel_case() {
        let detail = sample_detail();
        let value = serde_json::to_value(&detail).unwrap();

        assert_eq!(value["type"], "competition");
        assert!(value["studentId"].is_string());
        assert_eq!(value["details"]["eventDate"], "2025-09-01");
        assert_eq!(value["details"]["competitionLevel"], "regional");
        // Unset optional fields are omitted from the document entirely.
        assert!(value["details"].get("publisher").is_none());
    }

    #[test]
    fn test_custom_fields_roundtrip() {
        let mut detail = sample_detail();
        detail
            .details
            .custom_fields
            .insert("juryNote".into(), serde_json::json!("unanimous"));

        let json = serde_json::to_string(&detail).unwrap();
        let parsed: AchievementDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed.details.custom_fields.get("juryNote"),
            Some(&serde_json::json!("unanimous"))
        );
    }
}
