use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::AchievementStatus;

/// The workflow-state record of an achievement, as held in the relational
/// store. One reference owns exactly one detail document via `detail_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementReference {
    pub id: Uuid,
    /// Student profile that owns the achievement.
    pub student_id: Uuid,
    /// Opaque id of the matching document in the detail store.
    pub detail_id: String,
    pub status: AchievementStatus,
    /// Stamped the first time the record leaves `draft`.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Stamped when the record reaches `verified` or `rejected`.
    pub verified_at: Option<DateTime<Utc>>,
    /// Advisor profile that last verified or rejected the record.
    pub verified_by: Option<Uuid>,
    /// Non-empty exactly when `status` is `rejected`.
    pub rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AchievementReference {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for a new draft reference. The store assigns the id and stamps the
/// creation timestamps; status always starts at `draft`.
#[derive(Clone, Debug)]
pub struct NewReference {
    pub student_id: Uuid,
    pub detail_id: String,
}
