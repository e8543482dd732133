use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::{hash, jwt};
use crate::authz::resolve_actor;
use crate::entity::{role, role_permission, student_profile, user};
use crate::error::AppError;
use crate::extractors::{AppJson, AuthUser};
use crate::models::auth::{
    LoginData, LoginRequest, MeResponse, RefreshRequest, RegisterRequest, RegisterResponse,
    TokenData, UserBody, validate_login_request, validate_register_request,
};
use crate::models::shared::Envelope;
use crate::state::AppState;

/// Permissions attached to a role, for token claims.
async fn permissions_for_role<C: ConnectionTrait>(
    db: &C,
    role_name: &str,
) -> Result<Vec<String>, AppError> {
    let rows = role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role_name))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|rp| rp.permission).collect())
}

/// Handle student self-registration: the account and its student profile
/// are created together.
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let username = payload.username.trim().to_string();

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;

    let new_user = user::ActiveModel {
        username: Set(username),
        password: Set(password_hash),
        full_name: Set(payload.full_name.trim().to_string()),
        role: Set(role::DEFAULT_ROLE.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = new_user.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
        _ => AppError::from(e),
    })?;

    let profile = student_profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(created.id),
        student_number: Set(payload.student_number.trim().to_string()),
        program: Set(payload.program.trim().to_string()),
        year: Set(payload.year),
        advisor_id: Set(None),
        created_at: Set(Utc::now()),
    };

    let profile = profile.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Validation("Student number is already registered".into())
        }
        _ => AppError::from(e),
    })?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: created.id,
            username: created.username,
            student_profile_id: profile.id,
        }),
    ))
}

/// Handle login: returns the `{status, data}` envelope with an access token,
/// a refresh token and the user block.
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<Envelope<LoginData>>, AppError> {
    validate_login_request(&payload)?;

    let username = payload.username.trim();

    let account = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &account.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let permissions = permissions_for_role(&state.db, &account.role).await?;

    let auth_cfg = &state.config.auth;
    let issued = jwt::sign_access(
        account.id,
        &account.role,
        permissions.clone(),
        &auth_cfg.jwt_secret,
        auth_cfg.access_ttl_minutes,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let refresh_token = jwt::sign_refresh(account.id, &auth_cfg.jwt_secret, auth_cfg.refresh_ttl_days)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(Envelope::success(LoginData {
        token: issued.token,
        refresh_token,
        user: UserBody::from_user(account, permissions),
    })))
}

/// Exchange a refresh token for a fresh access token (new token id).
/// Access tokens are rejected here.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<Envelope<TokenData>>, AppError> {
    let claims = jwt::verify_refresh(&payload.refresh_token, &state.config.auth.jwt_secret)
        .map_err(|_| AppError::TokenInvalid)?;

    let account = user::Entity::find_by_id(claims.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let permissions = permissions_for_role(&state.db, &account.role).await?;

    let auth_cfg = &state.config.auth;
    let issued = jwt::sign_access(
        account.id,
        &account.role,
        permissions,
        &auth_cfg.jwt_secret,
        auth_cfg.access_ttl_minutes,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(Envelope::success(TokenData {
        token: issued.token,
    })))
}

/// Revoke the presented access token for its remaining validity.
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn logout(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Json<Envelope<serde_json::Value>> {
    let expires_at = DateTime::<Utc>::from_timestamp(auth_user.expires_at, 0)
        .unwrap_or_else(Utc::now);
    state.revoked.revoke(auth_user.token_id, expires_at);

    Json(Envelope::success(serde_json::Value::Null))
}

/// Return the current authenticated identity, profile ids included.
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let account = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let actor = resolve_actor(&state.db, &auth_user).await?;

    Ok(Json(MeResponse {
        id: account.id,
        username: account.username,
        full_name: account.full_name,
        role: auth_user.role,
        permissions: auth_user.permissions,
        student_profile_id: actor.student_profile_id,
        advisor_profile_id: actor.advisor_profile_id,
    }))
}
