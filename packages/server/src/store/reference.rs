use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::store::{
    MonthCount, ReferenceStore, StatusCount, StoreError, StoreResult, StudentVerifiedCount,
    TransitionOutcome,
};
use common::{AchievementReference, AchievementStatus, NewReference};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::achievement_reference as reference;

/// Reference-store gateway backed by the relational database.
///
/// Every call runs under the configured deadline; exceeding it abandons the
/// in-flight query and surfaces `DeadlineExceeded`.
pub struct SqlReferenceStore {
    db: DatabaseConnection,
    timeout: Duration,
}

impl SqlReferenceStore {
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    async fn call<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, DbErr>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::DeadlineExceeded),
        }
    }
}

fn live() -> Select<reference::Entity> {
    reference::Entity::find().filter(reference::Column::DeletedAt.is_null())
}

#[async_trait]
impl ReferenceStore for SqlReferenceStore {
    async fn insert_draft(&self, new: NewReference) -> StoreResult<AchievementReference> {
        let now = Utc::now();
        let model = reference::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(new.student_id),
            detail_id: Set(new.detail_id),
            status: Set(AchievementStatus::Draft),
            submitted_at: Set(None),
            verified_at: Set(None),
            verified_by: Set(None),
            rejection_note: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let inserted = self.call(model.insert(&self.db)).await?;
        Ok(inserted.into())
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<AchievementReference>> {
        let row = self
            .call(live().filter(reference::Column::Id.eq(id)).one(&self.db))
            .await?;
        Ok(row.map(Into::into))
    }

    async fn get_by_student_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<AchievementReference>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let rows = self
            .call(
                live()
                    .filter(reference::Column::StudentId.is_in(ids.to_vec()))
                    .order_by_desc(reference::Column::CreatedAt)
                    .all(&self.db),
            )
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_all(&self) -> StoreResult<Vec<AchievementReference>> {
        let rows = self
            .call(
                live()
                    .order_by_desc(reference::Column::CreatedAt)
                    .all(&self.db),
            )
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_by_detail_id(&self, detail_id: &str) -> StoreResult<Option<AchievementReference>> {
        let row = self
            .call(
                live()
                    .filter(reference::Column::DetailId.eq(detail_id))
                    .one(&self.db),
            )
            .await?;
        Ok(row.map(Into::into))
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: AchievementStatus,
        to: AchievementStatus,
        note: Option<String>,
        verifier: Option<Uuid>,
    ) -> StoreResult<TransitionOutcome> {
        let now = Utc::now();

        let mut update = reference::Entity::update_many()
            .col_expr(reference::Column::Status, Expr::value(to))
            .col_expr(reference::Column::UpdatedAt, Expr::value(now));

        if to == AchievementStatus::Submitted {
            update = update.col_expr(reference::Column::SubmittedAt, Expr::value(Some(now)));
        }
        if matches!(
            to,
            AchievementStatus::Verified | AchievementStatus::Rejected
        ) {
            update = update
                .col_expr(reference::Column::VerifiedAt, Expr::value(Some(now)))
                .col_expr(reference::Column::VerifiedBy, Expr::value(verifier))
                .col_expr(reference::Column::RejectionNote, Expr::value(note));
        }

        // The conditional update is the serialization point: of two
        // concurrent transitions on the same row, exactly one matches the
        // expected status.
        let result = self
            .call(
                update
                    .filter(reference::Column::Id.eq(id))
                    .filter(reference::Column::Status.eq(expected))
                    .filter(reference::Column::DeletedAt.is_null())
                    .exec(&self.db),
            )
            .await?;

        if result.rows_affected > 0 {
            let row = self
                .call(reference::Entity::find_by_id(id).one(&self.db))
                .await?
                .ok_or_else(|| {
                    StoreError::Unavailable("transition committed but row vanished".into())
                })?;
            return Ok(TransitionOutcome::Applied(row.into()));
        }

        // Zero rows: distinguish a missing row from a lost precondition.
        match self
            .call(live().filter(reference::Column::Id.eq(id)).one(&self.db))
            .await?
        {
            None => Ok(TransitionOutcome::NotFound),
            Some(row) => Ok(TransitionOutcome::Conflict(row.status)),
        }
    }

    async fn touch(&self, id: Uuid) -> StoreResult<()> {
        // Best-effort updated_at tick; a vanished row is not this call's
        // problem to report.
        self.call(
            reference::Entity::update_many()
                .col_expr(reference::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(reference::Column::Id.eq(id))
                .filter(reference::Column::DeletedAt.is_null())
                .exec(&self.db),
        )
        .await?;
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        let result = self
            .call(
                reference::Entity::update_many()
                    .col_expr(reference::Column::DeletedAt, Expr::value(Some(at)))
                    .col_expr(reference::Column::UpdatedAt, Expr::value(at))
                    .filter(reference::Column::Id.eq(id))
                    .filter(reference::Column::DeletedAt.is_null())
                    .exec(&self.db),
            )
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("reference {id}")));
        }
        Ok(())
    }

    async fn is_soft_deleted(&self, id: Uuid) -> StoreResult<bool> {
        let row = self
            .call(reference::Entity::find_by_id(id).one(&self.db))
            .await?;
        Ok(row.is_some_and(|r| r.deleted_at.is_some()))
    }

    async fn count_by_status(&self) -> StoreResult<Vec<StatusCount>> {
        let rows: Vec<(String, i64)> = self
            .call(
                reference::Entity::find()
                    .select_only()
                    .column(reference::Column::Status)
                    .column_as(Expr::col(reference::Column::Id).count(), "count")
                    .filter(reference::Column::DeletedAt.is_null())
                    .group_by(reference::Column::Status)
                    .into_tuple()
                    .all(&self.db),
            )
            .await?;

        rows.into_iter()
            .map(|(status, count)| {
                let status = status
                    .parse::<AchievementStatus>()
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                Ok(StatusCount {
                    status,
                    count: count as u64,
                })
            })
            .collect()
    }

    async fn monthly_submissions(&self, months: u32) -> StoreResult<Vec<MonthCount>> {
        let cutoff = Utc::now()
            .checked_sub_months(chrono::Months::new(months))
            .expect("valid timestamp");

        let stamps: Vec<DateTime<Utc>> = self
            .call(
                reference::Entity::find()
                    .select_only()
                    .column(reference::Column::SubmittedAt)
                    .filter(reference::Column::DeletedAt.is_null())
                    .filter(reference::Column::SubmittedAt.gt(cutoff))
                    .into_tuple()
                    .all(&self.db),
            )
            .await?;

        let mut buckets: BTreeMap<String, u64> = BTreeMap::new();
        for ts in stamps {
            *buckets.entry(ts.format("%Y-%m").to_string()).or_insert(0) += 1;
        }

        Ok(buckets
            .into_iter()
            .map(|(month, count)| MonthCount { month, count })
            .collect())
    }

    async fn top_verified_students(&self, limit: u64) -> StoreResult<Vec<StudentVerifiedCount>> {
        let rows: Vec<(Uuid, i64)> = self
            .call(
                reference::Entity::find()
                    .select_only()
                    .column(reference::Column::StudentId)
                    .column_as(Expr::col(reference::Column::Id).count(), "count")
                    .filter(reference::Column::Status.eq(AchievementStatus::Verified))
                    .filter(reference::Column::DeletedAt.is_null())
                    .group_by(reference::Column::StudentId)
                    .into_tuple()
                    .all(&self.db),
            )
            .await?;

        let mut counts: Vec<StudentVerifiedCount> = rows
            .into_iter()
            .map(|(student_id, count)| StudentVerifiedCount {
                student_id,
                count: count as u64,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(limit as usize);
        Ok(counts)
    }
}
