use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::achievement::AchievementResponse;
use crate::entity::{student_profile, user};
use crate::error::AppError;

/// A student profile as listed to admins and embedded in reports.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub id: Uuid,
    #[schema(example = 42)]
    pub user_id: i32,
    #[schema(example = "Alice Wonder")]
    pub full_name: String,
    #[schema(example = "2201234567")]
    pub student_number: String,
    #[schema(example = "Computer Science")]
    pub program: String,
    #[schema(example = 2)]
    pub year: i32,
    pub advisor_id: Option<Uuid>,
}

impl StudentResponse {
    pub fn from_profile(profile: student_profile::Model, user: user::Model) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            full_name: user.full_name,
            student_number: profile.student_number,
            program: profile.program,
            year: profile.year,
            advisor_id: profile.advisor_id,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<StudentResponse>,
    #[schema(example = 12)]
    pub total: usize,
}

/// Request body for (re)assigning a student's advisor. `null` clears the
/// mapping.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdvisorRequest {
    pub advisor_id: Option<Uuid>,
}

/// Per-student report: profile plus that student's achievements.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentReportResponse {
    pub student: StudentResponse,
    pub achievements: Vec<AchievementResponse>,
}

/// Request body for admin account creation (advisors and further admins;
/// students self-register).
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[schema(example = "dr_bloom")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    #[schema(example = "Dr. Bloom")]
    pub full_name: String,
    /// `advisor` or `admin`.
    #[schema(example = "advisor")]
    pub role: String,
    /// Required for advisors.
    #[serde(default)]
    pub department: Option<String>,
}

pub fn validate_create_user(payload: &CreateUserRequest) -> Result<(), AppError> {
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
    match payload.role.as_str() {
        "advisor" => {
            if payload
                .department
                .as_deref()
                .is_none_or(|d| d.trim().is_empty())
            {
                return Err(AppError::Validation(
                    "Department is required for advisors".into(),
                ));
            }
        }
        "admin" => {}
        other => {
            return Err(AppError::Validation(format!(
                "Role must be advisor or admin, got '{other}'"
            )));
        }
    }
    Ok(())
}

/// Successful account-creation response.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    #[schema(example = 43)]
    pub id: i32,
    pub username: String,
    pub role: String,
    pub advisor_profile_id: Option<Uuid>,
}
