use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::Pagination;
use crate::entity::integrity_alert;

/// Query parameters for listing integrity alerts.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct AlertListQuery {
    /// Filter by resolution state.
    pub resolved: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub id: i32,
    #[schema(example = "DETAIL_MISSING")]
    pub kind: String,
    pub reference_id: Option<Uuid>,
    pub detail_id: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

impl From<integrity_alert::Model> for AlertResponse {
    fn from(m: integrity_alert::Model) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            reference_id: m.reference_id,
            detail_id: m.detail_id,
            message: m.message,
            created_at: m.created_at,
            resolved: m.resolved,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AlertListResponse {
    pub data: Vec<AlertResponse>,
    pub pagination: Pagination,
}
