use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Out-of-band record of a cross-store integrity incident: a failed
/// compensation or a reference whose detail document went missing.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "integrity_alert")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Machine-readable alert kind (COMPENSATION_FAILED, DETAIL_MISSING).
    #[sea_orm(indexed)]
    pub kind: String,

    pub reference_id: Option<Uuid>,
    pub detail_id: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub created_at: DateTimeUtc,

    #[sea_orm(default_value = false, indexed)]
    pub resolved: bool,
    pub resolved_at: Option<DateTimeUtc>,
    pub resolved_by: Option<i32>,
}

impl ActiveModelBehavior for ActiveModel {}
