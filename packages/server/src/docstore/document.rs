use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One achievement document in the detail store.
///
/// The whole document (camelCase, open-ended `details` object included)
/// lives in `body`; `student_id` and `deleted_at` are lifted out for
/// filtering. This entity syncs on the detail-store connection only, never
/// on the reference database.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievement")]
pub struct Model {
    /// Opaque document id referenced by `achievement_reference.detail_id`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub student_id: Uuid,

    #[sea_orm(column_type = "JsonBinary")]
    pub body: serde_json::Value,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
