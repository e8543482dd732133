use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::store::memory::event_year;
use common::store::{DetailStore, KeyCount, StoreError, StoreResult};
use common::{AchievementDetail, Attachment, DetailPatch, NewDetail};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use super::document;

/// Detail-store gateway backed by a JSON document collection on its own
/// connection. Shares no tables and no transactions with the reference
/// database.
pub struct SqlDetailStore {
    db: DatabaseConnection,
    timeout: Duration,
}

impl SqlDetailStore {
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

    /// Read one live document or fail with `NotFound`.
    async fn get_live(&self, id: &str) -> StoreResult<AchievementDetail> {
        let model = self
            .call(
                document::Entity::find_by_id(id.to_owned())
                    .filter(document::Column::DeletedAt.is_null())
                    .one(&self.db),
            )
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("detail {id}")))?;
        decode(model)
    }

    /// Write a document's body back and stamp `updated_at`.
    async fn write_back(&self, doc: &AchievementDetail) -> StoreResult<()> {
        let body = serde_json::to_value(doc)?;
        self.call(
            document::Entity::update_many()
                .col_expr(document::Column::Body, Expr::value(body))
                .col_expr(document::Column::UpdatedAt, Expr::value(doc.updated_at))
                .filter(document::Column::Id.eq(doc.id.clone()))
                .exec(&self.db),
        )
        .await?;
        Ok(())
    }

    async fn fold_live<F>(&self, mut key_of: F) -> StoreResult<Vec<KeyCount>>
    where
        F: FnMut(&AchievementDetail) -> Option<String>,
    {
        let models = self
            .call(
                document::Entity::find()
                    .filter(document::Column::DeletedAt.is_null())
                    .all(&self.db),
            )
            .await?;

        let mut counts: HashMap<String, u64> = HashMap::new();
        for model in models {
            let doc = decode(model)?;
            if let Some(key) = key_of(&doc) {
                *counts.entry(key).or_insert(0) += 1;
            }
        }

        let mut rows: Vec<KeyCount> = counts
            .into_iter()
            .map(|(key, count)| KeyCount { key, count })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        Ok(rows)
    }
}

/// Decode a stored document. The soft-delete marker and `updated_at` columns
/// are authoritative over whatever the body carries.
fn decode(model: document::Model) -> StoreResult<AchievementDetail> {
    let mut doc: AchievementDetail = serde_json::from_value(model.body)?;
    doc.updated_at = model.updated_at;
    doc.deleted_at = model.deleted_at;
    Ok(doc)
}

#[async_trait]
impl DetailStore for SqlDetailStore {
    async fn insert(&self, new: NewDetail) -> StoreResult<AchievementDetail> {
        let now = Utc::now();
        let doc = AchievementDetail {
            id: Uuid::new_v4().simple().to_string(),
            student_id: new.student_id,
            kind: new.kind,
            title: new.title,
            description: new.description,
            tags: new.tags,
            points: new.points,
            attachments: Vec::new(),
            details: new.details,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let model = document::ActiveModel {
            id: Set(doc.id.clone()),
            student_id: Set(doc.student_id),
            body: Set(serde_json::to_value(&doc)?),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };
        self.call(model.insert(&self.db)).await?;

        Ok(doc)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<AchievementDetail>> {
        let model = self
            .call(document::Entity::find_by_id(id.to_owned()).one(&self.db))
            .await?;
        model.map(decode).transpose()
    }

    async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<AchievementDetail>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let models = self
            .call(
                document::Entity::find()
                    .filter(document::Column::Id.is_in(ids.to_vec()))
                    .filter(document::Column::DeletedAt.is_null())
                    .all(&self.db),
            )
            .await?;
        models.into_iter().map(decode).collect()
    }

    async fn replace_fields(&self, id: &str, patch: DetailPatch) -> StoreResult<AchievementDetail> {
        let mut doc = self.get_live(id).await?;
        patch.apply(&mut doc);
        doc.updated_at = Utc::now();
        self.write_back(&doc).await?;
        Ok(doc)
    }

    async fn append_attachment(&self, id: &str, att: Attachment) -> StoreResult<AchievementDetail> {
        // Decoding defaults a missing attachments array to empty, so the
        // push below always has an array to land in.
        let mut doc = self.get_live(id).await?;
        doc.attachments.push(att);
        doc.updated_at = Utc::now();
        self.write_back(&doc).await?;
        Ok(doc)
    }

    async fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let result = self
            .call(
                document::Entity::update_many()
                    .col_expr(document::Column::DeletedAt, Expr::value(Some(at)))
                    .col_expr(document::Column::UpdatedAt, Expr::value(at))
                    .filter(document::Column::Id.eq(id))
                    .filter(document::Column::DeletedAt.is_null())
                    .exec(&self.db),
            )
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("detail {id}")));
        }
        Ok(())
    }

    async fn restore(&self, id: &str) -> StoreResult<()> {
        let result = self
            .call(
                document::Entity::update_many()
                    .col_expr(
                        document::Column::DeletedAt,
                        Expr::value(Option::<DateTime<Utc>>::None),
                    )
                    .col_expr(document::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(document::Column::Id.eq(id))
                    .exec(&self.db),
            )
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("detail {id}")));
        }
        Ok(())
    }

    async fn hard_delete(&self, id: &str) -> StoreResult<()> {
        self.call(
            document::Entity::delete_many()
                .filter(document::Column::Id.eq(id))
                .exec(&self.db),
        )
        .await?;
        Ok(())
    }

    async fn count_by_type(&self) -> StoreResult<Vec<KeyCount>> {
        self.fold_live(|d| Some(d.kind.clone())).await
    }

    async fn count_by_event_year(&self) -> StoreResult<Vec<KeyCount>> {
        self.fold_live(|d| d.details.event_date.as_deref().and_then(event_year))
            .await
    }

    async fn count_by_competition_level(&self) -> StoreResult<Vec<KeyCount>> {
        self.fold_live(|d| d.details.competition_level.clone())
            .await
    }
}
