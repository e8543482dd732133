use std::collections::HashSet;
use std::str::FromStr;

use sea_orm::*;
use uuid::Uuid;

use super::kernel::{Actor, UserRole};
use crate::entity::{advisor_profile, student_profile};
use crate::error::AppError;
use crate::extractors::AuthUser;

/// Resolve the token identity into a full [`Actor`].
///
/// Loads whichever profiles exist for the user; a student or advisor role
/// without its profile row is a data error and surfaces as
/// `PROFILE_MISSING`. Advisees load eagerly so the kernel stays a pure
/// function.
pub async fn resolve_actor(db: &DatabaseConnection, auth: &AuthUser) -> Result<Actor, AppError> {
    let role = UserRole::from_str(&auth.role).map_err(|_| AppError::PermissionDenied)?;

    let student = student_profile::Entity::find()
        .filter(student_profile::Column::UserId.eq(auth.user_id))
        .one(db)
        .await?;

    let advisor = advisor_profile::Entity::find()
        .filter(advisor_profile::Column::UserId.eq(auth.user_id))
        .one(db)
        .await?;

    match role {
        UserRole::Student if student.is_none() => return Err(AppError::ProfileMissing),
        UserRole::Advisor if advisor.is_none() => return Err(AppError::ProfileMissing),
        _ => {}
    }

    let advisees: HashSet<Uuid> = match &advisor {
        Some(profile) => student_profile::Entity::find()
            .select_only()
            .column(student_profile::Column::Id)
            .filter(student_profile::Column::AdvisorId.eq(profile.id))
            .into_tuple::<Uuid>()
            .all(db)
            .await?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    Ok(Actor {
        user_id: auth.user_id,
        role,
        permissions: auth.permissions.clone(),
        student_profile_id: student.map(|s| s.id),
        advisor_profile_id: advisor.map(|a| a.id),
        advisees,
    })
}
