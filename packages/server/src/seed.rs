use sea_orm::*;
use sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::entity::{achievement_reference, role, role_permission};

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &["student", "advisor", "admin"];

/// Default role-permission mappings seeded on startup.
///
/// Admins short-circuit permission checks in the kernel; their mapping is
/// seeded anyway so tokens carry the full list.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Student: own records, draft-gated edits and deletes
    ("student", "achievement:create"),
    ("student", "achievement:read"),
    ("student", "achievement:update"),
    ("student", "achievement:submit"),
    ("student", "achievement:delete"),
    // Advisor: advisee records and the verification workflow
    ("advisor", "achievement:read"),
    ("advisor", "achievement:verify"),
    ("advisor", "stats:read"),
    // Admin
    ("admin", "achievement:create"),
    ("admin", "achievement:read"),
    ("admin", "achievement:update"),
    ("admin", "achievement:submit"),
    ("admin", "achievement:delete"),
    ("admin", "achievement:verify"),
    ("admin", "stats:read"),
    ("admin", "user:manage"),
    ("admin", "advisor:update"),
    ("admin", "alert:read"),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(role::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => roles_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => perms_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Composite index for scope listings:
    // SELECT * FROM achievement_reference WHERE student_id IN (...) AND deleted_at IS NULL
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_reference_student_status")
        .table(achievement_reference::Entity)
        .col(achievement_reference::Column::StudentId)
        .col(achievement_reference::Column::Status)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_reference_student_status exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_reference_student_status: {}", e);
        }
    }

    // Composite index for the monthly submission trend:
    // bucket submitted_at for live rows by status
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_reference_status_submitted")
        .table(achievement_reference::Entity)
        .col(achievement_reference::Column::Status)
        .col(achievement_reference::Column::SubmittedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_reference_status_submitted exists");
        }
        Err(e) => {
            tracing::warn!(
                "Failed to create index idx_reference_status_submitted: {}",
                e
            );
        }
    }

    Ok(())
}
