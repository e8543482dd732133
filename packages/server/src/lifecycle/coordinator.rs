use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::store::{
    DetailStore, ReferenceStore, StoreError, StoreResult, TransitionOutcome,
};
use common::{
    AchievementDetail, AchievementReference, AchievementStatus, Attachment, DetailPatch,
    NewDetail, NewReference,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::integrity::{AlertKind, IntegrityAlert, IntegritySink};

/// Deadline for compensation writes. Independent of the request deadline so
/// a cancelled request cannot skip the undo.
const COMPENSATION_DEADLINE: Duration = Duration::from_secs(5);

/// A reference joined with its detail document; the unit read paths return.
#[derive(Clone, Debug)]
pub struct AchievementView {
    pub reference: AchievementReference,
    pub detail: AchievementDetail,
}

/// Which references a listing covers, decided by the caller's scope.
pub enum ListScope {
    /// The actor's own achievements.
    Own(Uuid),
    /// The achievements of the actor's advisees.
    Advisees(Vec<Uuid>),
    /// Everything; admin only.
    All,
}

/// Sequences every mutation that spans the two stores.
///
/// No cross-store transaction exists, so each multi-store write follows a
/// fixed order with a compensating undo for the first step when the second
/// fails: creates write detail-first and hard-delete the detail on a failed
/// reference insert; deletes soft-delete detail-first and restore it on a
/// failed reference delete. Any partial failure therefore leaves the system
/// observably clean-pre or clean-post, and the only transient window a
/// concurrent reader can hit (live reference, missing detail) maps to a
/// retryable `inconsistent` signal.
pub struct LifecycleCoordinator {
    references: Arc<dyn ReferenceStore>,
    details: Arc<dyn DetailStore>,
    alerts: Arc<dyn IntegritySink>,
}

/// Run a compensation step on its own task with a bounded deadline, so it
/// completes even when the request that needed it has been cancelled.
async fn run_compensation<F>(step: F) -> bool
where
    F: Future<Output = StoreResult<()>> + Send + 'static,
{
    let handle = tokio::spawn(tokio::time::timeout(COMPENSATION_DEADLINE, step));
    matches!(handle.await, Ok(Ok(Ok(()))))
}

impl LifecycleCoordinator {
    pub fn new(
        references: Arc<dyn ReferenceStore>,
        details: Arc<dyn DetailStore>,
        alerts: Arc<dyn IntegritySink>,
    ) -> Self {
        Self {
            references,
            details,
            alerts,
        }
    }

    /// Fetch the live reference a request addresses, for authorization and
    /// preconditions. Soft-deleted rows read as absent.
    pub async fn load_reference(&self, id: Uuid) -> Result<AchievementReference, AppError> {
        self.references
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Achievement not found".into()))
    }

    /// Create an achievement: detail document first, reference row second.
    #[instrument(skip(self, content), fields(student_id = %student_id))]
    pub async fn create(
        &self,
        student_id: Uuid,
        content: NewDetail,
    ) -> Result<AchievementView, AppError> {
        let detail = self.details.insert(content).await?;

        match self
            .references
            .insert_draft(NewReference {
                student_id,
                detail_id: detail.id.clone(),
            })
            .await
        {
            Ok(reference) => Ok(AchievementView { reference, detail }),
            Err(err) => {
                let original = AppError::from(err);

                let details = Arc::clone(&self.details);
                let detail_id = detail.id.clone();
                let compensated =
                    run_compensation(async move { details.hard_delete(&detail_id).await }).await;

                if compensated {
                    warn!(detail_id = %detail.id, "Reference insert failed; orphaned detail removed");
                    Err(original)
                } else {
                    self.alerts
                        .record(IntegrityAlert {
                            kind: AlertKind::CompensationFailed,
                            reference_id: None,
                            detail_id: Some(detail.id.clone()),
                            message: "create compensation failed; orphaned detail document remains"
                                .into(),
                        })
                        .await;
                    Err(AppError::Inconsistent(
                        "Achievement creation failed and cleanup is incomplete".into(),
                    ))
                }
            }
        }
    }

    /// Join a loaded reference with its detail document.
    ///
    /// A live reference whose detail is missing or soft-deleted is the
    /// transient window of an in-flight delete (or a real integrity hole):
    /// surface it as retryable and raise an alert.
    pub async fn compose(
        &self,
        reference: AchievementReference,
    ) -> Result<AchievementView, AppError> {
        match self.details.get_by_id(&reference.detail_id).await? {
            Some(detail) if !detail.is_deleted() => Ok(AchievementView { reference, detail }),
            _ => {
                self.alerts
                    .record(IntegrityAlert {
                        kind: AlertKind::DetailMissing,
                        reference_id: Some(reference.id),
                        detail_id: Some(reference.detail_id.clone()),
                        message: "live reference has no live detail document".into(),
                    })
                    .await;
                Err(AppError::Inconsistent(
                    "Achievement content is temporarily unavailable; retry".into(),
                ))
            }
        }
    }

    /// Scope-aware listing: one reference query, one detail multi-get, left
    /// join on `detail_id`. References whose detail is missing drop out of
    /// the projection; the read-one path reconciles them via alerts.
    pub async fn list(&self, scope: ListScope) -> Result<Vec<AchievementView>, AppError> {
        let references = match scope {
            ListScope::Own(student_id) => {
                self.references.get_by_student_ids(&[student_id]).await?
            }
            ListScope::Advisees(ids) => self.references.get_by_student_ids(&ids).await?,
            ListScope::All => self.references.get_all().await?,
        };

        if references.is_empty() {
            return Ok(vec![]);
        }

        let detail_ids: Vec<String> = references.iter().map(|r| r.detail_id.clone()).collect();
        let mut details: HashMap<String, AchievementDetail> = self
            .details
            .get_by_ids(&detail_ids)
            .await?
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();

        Ok(references
            .into_iter()
            .filter_map(|reference| {
                details
                    .remove(&reference.detail_id)
                    .map(|detail| AchievementView { reference, detail })
            })
            .collect())
    }

    /// Replace editable detail fields. Draft-only; single-store write, no
    /// compensation needed.
    pub async fn update_detail(
        &self,
        reference: &AchievementReference,
        patch: DetailPatch,
    ) -> Result<AchievementView, AppError> {
        if reference.status != AchievementStatus::Draft {
            return Err(AppError::InvalidState(format!(
                "cannot edit a {} achievement",
                reference.status
            )));
        }

        let detail = match self
            .details
            .replace_fields(&reference.detail_id, patch)
            .await
        {
            Ok(detail) => detail,
            Err(StoreError::NotFound(_)) => return self.missing_detail(reference).await,
            Err(e) => return Err(e.into()),
        };

        self.references.touch(reference.id).await?;

        Ok(AchievementView {
            reference: reference.clone(),
            detail,
        })
    }

    /// Append an attachment to the detail document. Draft-only.
    pub async fn append_attachment(
        &self,
        reference: &AchievementReference,
        attachment: Attachment,
    ) -> Result<AchievementView, AppError> {
        if reference.status != AchievementStatus::Draft {
            return Err(AppError::InvalidState(format!(
                "cannot attach files to a {} achievement",
                reference.status
            )));
        }

        let detail = match self
            .details
            .append_attachment(&reference.detail_id, attachment)
            .await
        {
            Ok(detail) => detail,
            Err(StoreError::NotFound(_)) => return self.missing_detail(reference).await,
            Err(e) => return Err(e.into()),
        };

        self.references.touch(reference.id).await?;

        Ok(AchievementView {
            reference: reference.clone(),
            detail,
        })
    }

    /// `draft -> submitted`.
    pub async fn submit(&self, id: Uuid) -> Result<AchievementReference, AppError> {
        self.apply_transition(
            id,
            AchievementStatus::Draft,
            AchievementStatus::Submitted,
            None,
            None,
        )
        .await
    }

    /// `submitted -> verified`, stamping the verifying advisor.
    pub async fn verify(
        &self,
        id: Uuid,
        verifier: Uuid,
    ) -> Result<AchievementReference, AppError> {
        self.apply_transition(
            id,
            AchievementStatus::Submitted,
            AchievementStatus::Verified,
            None,
            Some(verifier),
        )
        .await
    }

    /// `submitted -> rejected`. The note is validated non-empty before it
    /// gets here.
    pub async fn reject(
        &self,
        id: Uuid,
        verifier: Uuid,
        note: String,
    ) -> Result<AchievementReference, AppError> {
        self.apply_transition(
            id,
            AchievementStatus::Submitted,
            AchievementStatus::Rejected,
            Some(note),
            Some(verifier),
        )
        .await
    }

    /// Soft delete: detail first, reference second, restore the detail if
    /// the reference write fails.
    ///
    /// `force` is the admin override and skips the draft guard; callers log
    /// the override with actor and prior status.
    #[instrument(skip(self, reference), fields(reference_id = %reference.id))]
    pub async fn soft_delete(
        &self,
        reference: &AchievementReference,
        force: bool,
    ) -> Result<(), AppError> {
        if !force && reference.status != AchievementStatus::Draft {
            return Err(AppError::InvalidState(format!(
                "cannot delete a {} achievement",
                reference.status
            )));
        }

        let now = Utc::now();

        // Detail first: a read racing between the two writes sees a live
        // reference with a missing detail, which the read path reports as
        // retryable rather than as corruption.
        match self.details.soft_delete(&reference.detail_id, now).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                // Already gone. Record it and keep going so the reference
                // cannot outlive its content.
                self.alerts
                    .record(IntegrityAlert {
                        kind: AlertKind::DetailMissing,
                        reference_id: Some(reference.id),
                        detail_id: Some(reference.detail_id.clone()),
                        message: "delete found no live detail document".into(),
                    })
                    .await;
            }
            Err(e) => return Err(e.into()),
        }

        match self.references.soft_delete(reference.id, now).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let original = AppError::from(err);

                let details = Arc::clone(&self.details);
                let detail_id = reference.detail_id.clone();
                let compensated =
                    run_compensation(async move { details.restore(&detail_id).await }).await;

                if compensated {
                    warn!(reference_id = %reference.id, "Reference delete failed; detail restored");
                    Err(original)
                } else {
                    self.alerts
                        .record(IntegrityAlert {
                            kind: AlertKind::CompensationFailed,
                            reference_id: Some(reference.id),
                            detail_id: Some(reference.detail_id.clone()),
                            message: "delete compensation failed; detail is marked deleted under a live reference"
                                .into(),
                        })
                        .await;
                    Err(AppError::Inconsistent(
                        "Achievement deletion failed and cleanup is incomplete".into(),
                    ))
                }
            }
        }
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        expected: AchievementStatus,
        to: AchievementStatus,
        note: Option<String>,
        verifier: Option<Uuid>,
    ) -> Result<AchievementReference, AppError> {
        match self
            .references
            .transition(id, expected, to, note, verifier)
            .await?
        {
            TransitionOutcome::Applied(reference) => Ok(reference),
            TransitionOutcome::NotFound => Err(AppError::NotFound("Achievement not found".into())),
            TransitionOutcome::Conflict(actual) => Err(AppError::InvalidState(format!(
                "cannot move achievement from {actual} to {to}"
            ))),
        }
    }

    async fn missing_detail<T>(&self, reference: &AchievementReference) -> Result<T, AppError> {
        self.alerts
            .record(IntegrityAlert {
                kind: AlertKind::DetailMissing,
                reference_id: Some(reference.id),
                detail_id: Some(reference.detail_id.clone()),
                message: "live reference has no live detail document".into(),
            })
            .await;
        Err(AppError::Inconsistent(
            "Achievement content is temporarily unavailable; retry".into(),
        ))
    }
}
