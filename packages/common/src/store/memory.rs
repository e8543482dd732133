use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::traits::{DetailStore, KeyCount};
use crate::detail::{AchievementDetail, Attachment, DetailPatch, NewDetail};

/// In-memory detail store.
///
/// Backs the document gateway when no document database is configured (dev
/// mode) and serves as the detail side of the test harness. Contents do not
/// survive a restart.
#[derive(Default)]
pub struct MemoryDetailStore {
    docs: RwLock<HashMap<String, AchievementDetail>>,
}

impl MemoryDetailStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (not soft-deleted) documents.
    pub async fn live_count(&self) -> usize {
        self.docs
            .read()
            .await
            .values()
            .filter(|d| !d.is_deleted())
            .count()
    }

    async fn fold_live<F>(&self, mut key_of: F) -> Vec<KeyCount>
    where
        F: FnMut(&AchievementDetail) -> Option<String>,
    {
        let docs = self.docs.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for doc in docs.values().filter(|d| !d.is_deleted()) {
            if let Some(key) = key_of(doc) {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        let mut rows: Vec<KeyCount> = counts
            .into_iter()
            .map(|(key, count)| KeyCount { key, count })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        rows
    }
}

/// Year component of a `YYYY-MM-DD` event date, if parseable.
pub fn event_year(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y").to_string())
}

#[async_trait]
impl DetailStore for MemoryDetailStore {
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
        self.docs.write().await.insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<AchievementDetail>> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<AchievementDetail>> {
        let docs = self.docs.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| docs.get(id))
            .filter(|d| !d.is_deleted())
            .cloned()
            .collect())
    }

    async fn replace_fields(&self, id: &str, patch: DetailPatch) -> StoreResult<AchievementDetail> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(id)
            .filter(|d| !d.is_deleted())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply(doc);
        doc.updated_at = Utc::now();
        Ok(doc.clone())
    }

    async fn append_attachment(&self, id: &str, att: Attachment) -> StoreResult<AchievementDetail> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(id)
            .filter(|d| !d.is_deleted())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        doc.attachments.push(att);
        doc.updated_at = Utc::now();
        Ok(doc.clone())
    }

    async fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(id)
            .filter(|d| !d.is_deleted())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        doc.deleted_at = Some(at);
        doc.updated_at = at;
        Ok(())
    }

    async fn restore(&self, id: &str) -> StoreResult<()> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        doc.deleted_at = None;
        doc.updated_at = Utc::now();
        Ok(())
    }

    async fn hard_delete(&self, id: &str) -> StoreResult<()> {
        self.docs.write().await.remove(id);
        Ok(())
    }

    async fn count_by_type(&self) -> StoreResult<Vec<KeyCount>> {
        Ok(self.fold_live(|d| Some(d.kind.clone())).await)
    }

    async fn count_by_event_year(&self) -> StoreResult<Vec<KeyCount>> {
        Ok(self
            .fold_live(|d| d.details.event_date.as_deref().and_then(event_year))
            .await)
    }

    async fn count_by_competition_level(&self) -> StoreResult<Vec<KeyCount>> {
        Ok(self.fold_live(|d| d.details.competition_level.clone()).await)
    }
}
