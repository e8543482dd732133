use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;

/// Request body for student self-registration.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Unique username (1-32 chars, alphanumeric and underscores).
    #[schema(example = "alice_wonder")]
    pub username: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    #[schema(example = "Alice Wonder")]
    pub full_name: String,
    #[schema(example = "2201234567")]
    pub student_number: String,
    #[schema(example = "Computer Science")]
    pub program: String,
    /// Year of study.
    #[schema(example = 2)]
    pub year: i32,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 32 {
        return Err(AppError::Validation(
            "Username must be 1-32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    if payload.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name must not be empty".into()));
    }
    if payload.student_number.trim().is_empty() {
        return Err(AppError::Validation(
            "Student number must not be empty".into(),
        ));
    }
    if payload.program.trim().is_empty() {
        return Err(AppError::Validation("Program must not be empty".into()));
    }
    if !(1..=7).contains(&payload.year) {
        return Err(AppError::Validation("Year must be between 1 and 7".into()));
    }
    Ok(())
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Request body for minting a new access token.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// User block inside auth responses.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "Alice Wonder")]
    pub full_name: String,
    #[schema(example = "student")]
    pub role: String,
    #[schema(example = json!(["achievement:create"]))]
    pub permissions: Vec<String>,
}

impl UserBody {
    pub fn from_user(user: user::Model, permissions: Vec<String>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            role: user.role,
            permissions,
        }
    }
}

/// `data` payload of a successful login.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    /// Short-lived access token.
    pub token: String,
    /// Longer-lived refresh token carrying only the user id.
    pub refresh_token: String,
    pub user: UserBody,
}

/// `data` payload of a successful refresh.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenData {
    pub token: String,
}

/// Successful registration response.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// ID of the newly created user.
    #[schema(example = 42)]
    pub id: i32,
    pub username: String,
    pub student_profile_id: Uuid,
}

/// Current authenticated identity, profile ids included.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub student_profile_id: Option<Uuid>,
    pub advisor_profile_id: Option<Uuid>,
}
