use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::{AchievementStatus, Attachment};
use sea_orm::*;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::authz::{Action, Actor, Target, UserRole, authorize, resolve_actor};
use crate::entity::student_profile;
use crate::error::{AppError, ErrorBody};
use crate::extractors::{AppJson, AuthUser};
use crate::lifecycle::ListScope;
use crate::models::achievement::*;
use crate::state::AppState;

/// Body limit for attachment uploads; leaves headroom for multipart framing.
pub fn attachment_body_limit(max_size: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_size + 4096)
}

/// Resolve the student an achievement is created for, per the caller's role:
/// students record against themselves, admins must name a target.
async fn resolve_create_target(
    db: &DatabaseConnection,
    actor: &Actor,
    target_student_id: Option<Uuid>,
) -> Result<Uuid, AppError> {
    match actor.role {
        UserRole::Student => actor.student_profile_id.ok_or(AppError::ProfileMissing),
        UserRole::Admin => {
            let student_id = target_student_id.ok_or_else(|| {
                AppError::Validation("targetStudentId is required for admin creation".into())
            })?;
            student_profile::Entity::find_by_id(student_id)
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound("Student not found".into()))?;
            Ok(student_id)
        }
        UserRole::Advisor => Err(AppError::PermissionDenied),
    }
}

/// Create an achievement.
#[utoipa::path(
    post,
    path = "/",
    tag = "Achievements",
    operation_id = "createAchievement",
    summary = "Record a new achievement",
    description = "Creates a draft achievement: the detail document first, then the workflow \
        reference. Students record against their own profile; admins must pass `targetStudentId`. \
        Requires `achievement:create` permission.",
    request_body = CreateAchievementRequest,
    responses(
        (status = 201, description = "Achievement created", body = AchievementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Cleanup after a partial failure is incomplete (INCONSISTENT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAchievementRequest>,
) -> Result<impl IntoResponse, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::Create, None)?;
    validate_create_achievement(&payload)?;

    let student_id = resolve_create_target(&state.db, &actor, payload.target_student_id).await?;
    authorize(
        &actor,
        Action::Create,
        Some(&Target::new(student_id, AchievementStatus::Draft)),
    )?;

    let view = state
        .coordinator
        .create(student_id, payload.into_content(student_id))
        .await?;

    Ok((StatusCode::CREATED, Json(AchievementResponse::from(view))))
}

/// List achievements in the caller's scope.
#[utoipa::path(
    get,
    path = "/",
    tag = "Achievements",
    operation_id = "listAchievements",
    summary = "List achievements",
    description = "Students see their own achievements, advisors those of their advisees, admins \
        everything. Requires `achievement:read` permission.",
    responses(
        (status = 200, description = "List of achievements", body = AchievementListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_achievements(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AchievementListResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::List, None)?;

    let scope = if actor.is_admin() {
        ListScope::All
    } else if actor.advisees.is_empty() {
        match actor.student_profile_id {
            Some(student_id) => ListScope::Own(student_id),
            None => {
                return Ok(Json(AchievementListResponse {
                    data: vec![],
                    total: 0,
                }));
            }
        }
    } else {
        let mut ids: Vec<Uuid> = actor.advisees.iter().copied().collect();
        if let Some(student_id) = actor.student_profile_id {
            ids.push(student_id);
        }
        ListScope::Advisees(ids)
    };

    let views = state.coordinator.list(scope).await?;
    let data: Vec<AchievementResponse> = views.into_iter().map(Into::into).collect();
    let total = data.len();

    Ok(Json(AchievementListResponse { data, total }))
}

/// Get a single achievement by id.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Achievements",
    operation_id = "getAchievement",
    summary = "Get achievement details",
    params(("id" = Uuid, Path, description = "Achievement ID")),
    responses(
        (status = 200, description = "Achievement details", body = AchievementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Detail temporarily unavailable (INCONSISTENT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(achievement_id = %id))]
pub async fn get_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AchievementResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    // Permission presence first: callers without read rights get forbidden
    // whether or not the record exists.
    authorize(&actor, Action::Read, None)?;

    let reference = state.coordinator.load_reference(id).await?;
    authorize(
        &actor,
        Action::Read,
        Some(&Target::new(reference.student_id, reference.status)),
    )?;

    let view = state.coordinator.compose(reference).await?;
    Ok(Json(view.into()))
}

/// Edit a draft achievement's detail fields.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Achievements",
    operation_id = "updateAchievement",
    summary = "Edit a draft achievement",
    description = "Shallow overwrite of the editable detail fields. Owners may edit only while \
        the achievement is in draft.",
    params(("id" = Uuid, Path, description = "Achievement ID")),
    request_body = UpdateAchievementRequest,
    responses(
        (status = 200, description = "Updated achievement", body = AchievementResponse),
        (status = 400, description = "Validation error or illegal state (VALIDATION_ERROR, INVALID_STATE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(achievement_id = %id))]
pub async fn update_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateAchievementRequest>,
) -> Result<Json<AchievementResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::UpdateDetail, None)?;
    validate_update_achievement(&payload)?;

    let reference = state.coordinator.load_reference(id).await?;
    authorize(
        &actor,
        Action::UpdateDetail,
        Some(&Target::new(reference.student_id, reference.status)),
    )?;

    let view = state
        .coordinator
        .update_detail(&reference, payload.into_patch())
        .await?;
    Ok(Json(view.into()))
}

/// Soft-delete an achievement.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Achievements",
    operation_id = "deleteAchievement",
    summary = "Delete an achievement",
    description = "Owners may delete while the achievement is in draft; admins may force-delete \
        in any status.",
    params(("id" = Uuid, Path, description = "Achievement ID")),
    responses(
        (status = 204, description = "Achievement deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Cleanup after a partial failure is incomplete (INCONSISTENT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(achievement_id = %id))]
pub async fn delete_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::Delete, None)?;

    let reference = state.coordinator.load_reference(id).await?;
    authorize(
        &actor,
        Action::Delete,
        Some(&Target::new(reference.student_id, reference.status)),
    )?;

    let force = actor.is_admin();
    if force && reference.status != AchievementStatus::Draft {
        info!(
            admin_user_id = actor.user_id,
            achievement_id = %reference.id,
            prior_status = %reference.status,
            "Admin force-delete override"
        );
    }

    state.coordinator.soft_delete(&reference, force).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Submit a draft achievement for verification.
#[utoipa::path(
    post,
    path = "/{id}/submit",
    tag = "Achievements",
    operation_id = "submitAchievement",
    summary = "Submit for verification",
    description = "Moves the achievement from draft to submitted. Re-submitting a submitted or \
        terminal achievement fails with INVALID_STATE.",
    params(("id" = Uuid, Path, description = "Achievement ID")),
    responses(
        (status = 200, description = "Submitted achievement", body = AchievementResponse),
        (status = 400, description = "Illegal transition (INVALID_STATE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(achievement_id = %id))]
pub async fn submit_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AchievementResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::Submit, None)?;

    let reference = state.coordinator.load_reference(id).await?;
    authorize(
        &actor,
        Action::Submit,
        Some(&Target::new(reference.student_id, reference.status)),
    )?;

    let reference = state.coordinator.submit(reference.id).await?;
    let view = state.coordinator.compose(reference).await?;
    Ok(Json(view.into()))
}

/// Verify a submitted achievement.
#[utoipa::path(
    post,
    path = "/{id}/verify",
    tag = "Achievements",
    operation_id = "verifyAchievement",
    summary = "Verify a submitted achievement",
    description = "Advisor-only: the target student must be one of the caller's advisees. \
        Requires `achievement:verify` permission.",
    params(("id" = Uuid, Path, description = "Achievement ID")),
    responses(
        (status = 200, description = "Verified achievement", body = AchievementResponse),
        (status = 400, description = "Illegal transition (INVALID_STATE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(achievement_id = %id))]
pub async fn verify_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AchievementResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::Verify, None)?;

    let reference = state.coordinator.load_reference(id).await?;
    authorize(
        &actor,
        Action::Verify,
        Some(&Target::new(reference.student_id, reference.status)),
    )?;

    let verifier = actor.advisor_profile_id.ok_or(AppError::ProfileMissing)?;
    let reference = state.coordinator.verify(reference.id, verifier).await?;
    let view = state.coordinator.compose(reference).await?;
    Ok(Json(view.into()))
}

/// Reject a submitted achievement with a note.
#[utoipa::path(
    post,
    path = "/{id}/reject",
    tag = "Achievements",
    operation_id = "rejectAchievement",
    summary = "Reject a submitted achievement",
    description = "Advisor-only. `rejectionNote` is required and must be non-empty; rejected \
        achievements are terminal.",
    params(("id" = Uuid, Path, description = "Achievement ID")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Rejected achievement", body = AchievementResponse),
        (status = 400, description = "Validation error or illegal transition (VALIDATION_ERROR, INVALID_STATE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(achievement_id = %id))]
pub async fn reject_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<RejectRequest>,
) -> Result<Json<AchievementResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::Reject, None)?;
    validate_reject(&payload)?;

    let reference = state.coordinator.load_reference(id).await?;
    authorize(
        &actor,
        Action::Reject,
        Some(&Target::new(reference.student_id, reference.status)),
    )?;

    let verifier = actor.advisor_profile_id.ok_or(AppError::ProfileMissing)?;
    let reference = state
        .coordinator
        .reject(reference.id, verifier, payload.rejection_note.trim().to_string())
        .await?;
    let view = state.coordinator.compose(reference).await?;
    Ok(Json(view.into()))
}

/// Upload a file attachment to a draft achievement.
#[utoipa::path(
    post,
    path = "/{id}/attachments",
    tag = "Achievements",
    operation_id = "uploadAttachment",
    summary = "Attach a file to a draft achievement",
    description = "Stores the uploaded `file` multipart field under the attachments root and \
        appends its metadata to the detail document. Draft-only.",
    params(("id" = Uuid, Path, description = "Achievement ID")),
    request_body(content_type = "multipart/form-data", description = "File upload"),
    responses(
        (status = 201, description = "Attachment recorded", body = AchievementResponse),
        (status = 400, description = "Validation error or illegal state (VALIDATION_ERROR, INVALID_STATE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(achievement_id = %id))]
pub async fn upload_attachment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::UploadAttachment, None)?;

    let reference = state.coordinator.load_reference(id).await?;
    authorize(
        &actor,
        Action::UploadAttachment,
        Some(&Target::new(reference.student_id, reference.status)),
    )?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() == Some("file") {
            let file_name = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("Uploaded file needs a filename".into()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.to_string()))?;
            upload = Some((file_name, bytes.to_vec()));
            break;
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::Validation("Multipart field 'file' is required".into()))?;

    if bytes.len() > state.config.attachments.max_size {
        return Err(AppError::Validation(format!(
            "File exceeds the {} byte limit",
            state.config.attachments.max_size
        )));
    }

    let file_type = mime_guess::from_path(&file_name)
        .first_or_octet_stream()
        .to_string();

    // Stored under an opaque name; the original filename only lives in the
    // attachment metadata.
    let stored_name = match std::path::Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4().simple()),
        None => Uuid::new_v4().simple().to_string(),
    };

    let root = std::path::PathBuf::from(&state.config.attachments.root);
    tokio::fs::create_dir_all(&root)
        .await
        .map_err(|e| AppError::Internal(format!("Attachment root unavailable: {e}")))?;
    tokio::fs::write(root.join(&stored_name), &bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Attachment write failed: {e}")))?;

    let attachment = Attachment {
        file_name,
        file_url: format!("/files/{stored_name}"),
        file_type,
        uploaded_at: Utc::now(),
    };

    let view = state
        .coordinator
        .append_attachment(&reference, attachment)
        .await?;

    Ok((StatusCode::CREATED, Json(AchievementResponse::from(view))))
}
