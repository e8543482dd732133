use common::AchievementStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Workflow-state row for one achievement. The open-ended content lives in
/// the detail store under `detail_id`; this row is the source of truth for
/// status and the verification audit fields.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievement_reference")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub student_id: Uuid,
    #[sea_orm(belongs_to, from = "student_id", to = "id")]
    pub student: HasOne<super::student_profile::Entity>,

    /// Opaque id of the matching document in the detail store.
    #[sea_orm(unique)]
    pub detail_id: String,

    #[sea_orm(indexed)]
    pub status: AchievementStatus,

    /// Stamped the first time the row leaves `draft`.
    pub submitted_at: Option<DateTimeUtc>,
    /// Stamped when the row reaches `verified` or `rejected`.
    pub verified_at: Option<DateTimeUtc>,
    /// Advisor profile that last verified or rejected the row.
    pub verified_by: Option<Uuid>,
    /// Non-empty exactly when `status` is `rejected`.
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_note: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Soft-delete marker; live reads filter on NULL.
    pub deleted_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for common::AchievementReference {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            detail_id: m.detail_id,
            status: m.status,
            submitted_at: m.submitted_at,
            verified_at: m.verified_at,
            verified_by: m.verified_by,
            rejection_note: m.rejection_note,
            created_at: m.created_at,
            updated_at: m.updated_at,
            deleted_at: m.deleted_at,
        }
    }
}
