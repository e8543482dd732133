use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::integrity_alert;

/// Kind of a cross-store integrity incident.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    /// A compensation step failed; the stores may disagree.
    CompensationFailed,
    /// A live reference points at a missing or soft-deleted detail.
    DetailMissing,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompensationFailed => "COMPENSATION_FAILED",
            Self::DetailMissing => "DETAIL_MISSING",
        }
    }
}

/// One incident on the out-of-band integrity channel.
#[derive(Clone, Debug)]
pub struct IntegrityAlert {
    pub kind: AlertKind,
    pub reference_id: Option<Uuid>,
    pub detail_id: Option<String>,
    pub message: String,
}

/// Sink for integrity incidents. Recording must never fail the operation
/// that raised the incident.
#[async_trait]
pub trait IntegritySink: Send + Sync {
    async fn record(&self, alert: IntegrityAlert);
}

/// Sink that persists alerts next to the reference data for operator
/// review, in addition to the error log.
pub struct SqlIntegritySink {
    db: DatabaseConnection,
}

impl SqlIntegritySink {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IntegritySink for SqlIntegritySink {
    async fn record(&self, alert: IntegrityAlert) {
        tracing::error!(
            kind = alert.kind.as_str(),
            reference_id = ?alert.reference_id,
            detail_id = ?alert.detail_id,
            message = %alert.message,
            "Integrity alert"
        );

        let model = integrity_alert::ActiveModel {
            kind: Set(alert.kind.as_str().to_string()),
            reference_id: Set(alert.reference_id),
            detail_id: Set(alert.detail_id),
            message: Set(alert.message),
            created_at: Set(Utc::now()),
            resolved: Set(false),
            resolved_at: Set(None),
            resolved_by: Set(None),
            ..Default::default()
        };

        if let Err(e) = model.insert(&self.db).await {
            // The log line above is the fallback record.
            tracing::error!(error = %e, "Failed to persist integrity alert");
        }
    }
}

/// List alerts for the admin endpoint, newest first.
pub async fn list_alerts(
    db: &DatabaseConnection,
    resolved: Option<bool>,
    page: u64,
    per_page: u64,
) -> Result<(Vec<integrity_alert::Model>, u64), DbErr> {
    let mut query = integrity_alert::Entity::find();

    if let Some(resolved) = resolved {
        query = query.filter(integrity_alert::Column::Resolved.eq(resolved));
    }

    let total = query.clone().count(db).await?;

    let alerts = query
        .order_by_desc(integrity_alert::Column::CreatedAt)
        .offset(page.saturating_sub(1) * per_page)
        .limit(per_page)
        .all(db)
        .await?;

    Ok((alerts, total))
}
