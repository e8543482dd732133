use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::StoreResult;
use crate::detail::{AchievementDetail, Attachment, DetailPatch, NewDetail};
use crate::reference::{AchievementReference, NewReference};
use crate::status::AchievementStatus;

/// Result of a conditional status transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The transition committed; contains the row as written.
    Applied(AchievementReference),
    /// No live row with that id exists.
    NotFound,
    /// The row exists but its status was not the expected source state.
    /// Contains the status actually observed.
    Conflict(AchievementStatus),
}

/// One bucket of the status histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: AchievementStatus,
    pub count: u64,
}

/// Submissions in one `YYYY-MM` bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthCount {
    pub month: String,
    pub count: u64,
}

/// Verified-achievement count for one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentVerifiedCount {
    pub student_id: Uuid,
    pub count: u64,
}

/// Group-count over a free-text key (type, competition level, event year).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCount {
    pub key: String,
    pub count: u64,
}

/// Gateway over the relational `achievement_reference` table.
///
/// All reads exclude soft-deleted rows unless stated otherwise.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Insert a new reference in `draft` with server-stamped timestamps.
    async fn insert_draft(&self, new: NewReference) -> StoreResult<AchievementReference>;

    /// Fetch one live reference by id. Soft-deleted rows read as absent.
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<AchievementReference>>;

    /// Fetch live references owned by any of the given students,
    /// newest first.
    async fn get_by_student_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<AchievementReference>>;

    /// Fetch every live reference, newest first.
    async fn get_all(&self) -> StoreResult<Vec<AchievementReference>>;

    /// Fetch the live reference owning the given detail document, if any.
    async fn get_by_detail_id(&self, detail_id: &str) -> StoreResult<Option<AchievementReference>>;

    /// Conditionally move a reference from `expected` to `to`.
    ///
    /// The write commits only if the row is live and still in `expected`;
    /// the conditional update is the serialization point between concurrent
    /// callers. Stamps `submitted_at` when first reaching `submitted` and
    /// `verified_at` when reaching `verified` or `rejected`; `updated_at`
    /// advances unconditionally.
    async fn transition(
        &self,
        id: Uuid,
        expected: AchievementStatus,
        to: AchievementStatus,
        note: Option<String>,
        verifier: Option<Uuid>,
    ) -> StoreResult<TransitionOutcome>;

    /// Advance `updated_at` without touching workflow state.
    async fn touch(&self, id: Uuid) -> StoreResult<()>;

    /// Mark a reference soft-deleted. Errors with `NotFound` when no live
    /// row matches.
    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;

    /// Whether a row exists and carries the soft-delete marker. Distinguishes
    /// "deleted" from "never existed", which `get_by_id` deliberately
    /// conflates.
    async fn is_soft_deleted(&self, id: Uuid) -> StoreResult<bool>;

    /// Group-count of live references by status.
    async fn count_by_status(&self) -> StoreResult<Vec<StatusCount>>;

    /// Live references bucketed by `submitted_at` year-month, for the last
    /// `months` months. Months with no submissions are omitted.
    async fn monthly_submissions(&self, months: u32) -> StoreResult<Vec<MonthCount>>;

    /// Top `limit` students by count of `verified` references,
    /// highest first.
    async fn top_verified_students(&self, limit: u64) -> StoreResult<Vec<StudentVerifiedCount>>;
}

/// Gateway over the document `achievement` collection.
#[async_trait]
pub trait DetailStore: Send + Sync {
    /// Insert a new document with a store-assigned id and server-stamped
    /// timestamps.
    async fn insert(&self, new: NewDetail) -> StoreResult<AchievementDetail>;

    /// Fetch one document by id, including soft-deleted documents; callers
    /// inspect `deleted_at` to distinguish the two failure modes of the
    /// read path.
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<AchievementDetail>>;

    /// Multi-get for listings. Soft-deleted and missing documents are
    /// simply absent from the result.
    async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<AchievementDetail>>;

    /// Shallow overwrite of the editable field set; see [`DetailPatch`].
    /// Stamps `updated_at`. Errors with `NotFound` when no live document
    /// matches.
    async fn replace_fields(&self, id: &str, patch: DetailPatch) -> StoreResult<AchievementDetail>;

    /// Append to the attachments array, creating the array if the document
    /// predates it. Errors with `NotFound` when no live document matches.
    async fn append_attachment(&self, id: &str, att: Attachment) -> StoreResult<AchievementDetail>;

    /// Mark a document soft-deleted.
    async fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()>;

    /// Clear the soft-delete marker. Used by delete compensation.
    async fn restore(&self, id: &str) -> StoreResult<()>;

    /// Remove a document entirely. Used by create compensation; absent
    /// documents are not an error.
    async fn hard_delete(&self, id: &str) -> StoreResult<()>;

    /// Group-count of live documents by `type`.
    async fn count_by_type(&self) -> StoreResult<Vec<KeyCount>>;

    /// Group-count of live documents by the year of `details.eventDate`.
    /// Documents without a parseable event date are omitted.
    async fn count_by_event_year(&self) -> StoreResult<Vec<KeyCount>>;

    /// Group-count of live documents by `details.competitionLevel`.
    async fn count_by_competition_level(&self) -> StoreResult<Vec<KeyCount>>;
}
