use axum::Json;
use axum::extract::{Path, State};
use common::AchievementStatus;
use sea_orm::*;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::authz::{Action, Target, authorize, resolve_actor};
use crate::entity::{advisor_profile, student_profile, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::{AppJson, AuthUser};
use crate::lifecycle::ListScope;
use crate::models::achievement::AchievementResponse;
use crate::models::student::{
    StudentListResponse, StudentReportResponse, StudentResponse, UpdateAdvisorRequest,
};
use crate::state::AppState;

async fn find_student_with_user<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<(student_profile::Model, user::Model), AppError> {
    let (profile, account) = student_profile::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))?;
    let account = account.ok_or_else(|| AppError::Internal("Student has no user row".into()))?;
    Ok((profile, account))
}

/// List all student profiles.
#[utoipa::path(
    get,
    path = "/",
    tag = "Students",
    operation_id = "listStudents",
    summary = "List student profiles",
    description = "Admin-only. Requires `user:manage` permission.",
    responses(
        (status = 200, description = "Student profiles", body = StudentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_students(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StudentListResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::ManageUsers, None)?;

    let rows = student_profile::Entity::find()
        .find_also_related(user::Entity)
        .order_by_asc(student_profile::Column::StudentNumber)
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(rows.len());
    for (profile, account) in rows {
        let account =
            account.ok_or_else(|| AppError::Internal("Student has no user row".into()))?;
        data.push(StudentResponse::from_profile(profile, account));
    }
    let total = data.len();

    Ok(Json(StudentListResponse { data, total }))
}

/// Assign or clear a student's advisor.
#[utoipa::path(
    patch,
    path = "/{id}/advisor",
    tag = "Students",
    operation_id = "updateAdvisor",
    summary = "Update a student's advisor mapping",
    description = "Admin-only. Passing `advisorId: null` clears the mapping. Requires \
        `advisor:update` permission.",
    params(("id" = Uuid, Path, description = "Student profile ID")),
    request_body = UpdateAdvisorRequest,
    responses(
        (status = 200, description = "Updated student profile", body = StudentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student or advisor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(student_id = %id))]
pub async fn update_advisor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateAdvisorRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::UpdateAdvisor, None)?;

    let (profile, account) = find_student_with_user(&state.db, id).await?;

    if let Some(advisor_id) = payload.advisor_id {
        advisor_profile::Entity::find_by_id(advisor_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Advisor not found".into()))?;
    }

    let mut active: student_profile::ActiveModel = profile.into();
    active.advisor_id = Set(payload.advisor_id);
    let updated = active.update(&state.db).await?;

    info!(
        admin_user_id = actor.user_id,
        student_id = %updated.id,
        advisor_id = ?updated.advisor_id,
        "Advisor mapping updated"
    );

    Ok(Json(StudentResponse::from_profile(updated, account)))
}

/// Per-student report: profile plus achievement list.
#[utoipa::path(
    get,
    path = "/{id}/report",
    tag = "Students",
    operation_id = "studentReport",
    summary = "Per-student achievement report",
    description = "Available to the student themselves, their advisor, and admins.",
    params(("id" = Uuid, Path, description = "Student profile ID")),
    responses(
        (status = 200, description = "Report", body = StudentReportResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(student_id = %id))]
pub async fn student_report(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentReportResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::List, None)?;

    let (profile, account) = find_student_with_user(&state.db, id).await?;

    // The list predicate only consults ownership; status is not part of the
    // decision here.
    authorize(
        &actor,
        Action::List,
        Some(&Target::new(profile.id, AchievementStatus::Draft)),
    )?;

    let views = state.coordinator.list(ListScope::Own(profile.id)).await?;
    let achievements: Vec<AchievementResponse> = views.into_iter().map(Into::into).collect();

    Ok(Json(StudentReportResponse {
        student: StudentResponse::from_profile(profile, account),
        achievements,
    }))
}
