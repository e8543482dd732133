use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::hash;
use crate::authz::{Action, authorize, resolve_actor};
use crate::entity::{advisor_profile, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::{AppJson, AuthUser};
use crate::models::student::{CreateUserRequest, CreateUserResponse, validate_create_user};
use crate::state::AppState;

/// Create an advisor or admin account. Students self-register instead.
#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create an advisor or admin account",
    description = "Admin-only. Advisor accounts get an advisor profile with the given \
        department. Requires `user:manage` permission.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = CreateUserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Username taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(username = %payload.username))]
pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::ManageUsers, None)?;
    validate_create_user(&payload)?;

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;

    let new_user = user::ActiveModel {
        username: Set(payload.username.trim().to_string()),
        password: Set(password_hash),
        full_name: Set(payload.full_name.trim().to_string()),
        role: Set(payload.role.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = new_user.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
        _ => AppError::from(e),
    })?;

    let advisor_profile_id = if payload.role == "advisor" {
        let department = payload.department.as_deref().unwrap_or_default();
        let profile = advisor_profile::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(created.id),
            department: Set(department.trim().to_string()),
            created_at: Set(Utc::now()),
        };
        Some(profile.insert(&txn).await?.id)
    } else {
        None
    };

    txn.commit().await?;

    info!(
        admin_user_id = actor.user_id,
        created_user_id = created.id,
        role = %created.role,
        "Account created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            id: created.id,
            username: created.username,
            role: created.role,
            advisor_profile_id,
        }),
    ))
}
