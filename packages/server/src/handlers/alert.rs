use std::cmp;

use axum::Json;
use axum::extract::{Query, State};
use tracing::instrument;

use crate::authz::{Action, authorize, resolve_actor};
use crate::error::{AppError, ErrorBody};
use crate::extractors::AuthUser;
use crate::integrity;
use crate::models::alert::{AlertListQuery, AlertListResponse, AlertResponse};
use crate::models::shared::Pagination;
use crate::state::AppState;

/// List integrity alerts for operator review.
#[utoipa::path(
    get,
    path = "/",
    tag = "Integrity Alerts",
    operation_id = "listAlerts",
    summary = "List cross-store integrity alerts",
    description = "Admin-only. Records of failed compensations and missing detail documents, \
        newest first.",
    params(AlertListQuery),
    responses(
        (status = 200, description = "Alerts", body = AlertListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_alerts(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AlertListQuery>,
) -> Result<Json<AlertListResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::ViewAlerts, None)?;

    let page = cmp::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let (alerts, total) = integrity::list_alerts(&state.db, query.resolved, page, per_page).await?;

    Ok(Json(AlertListResponse {
        data: alerts.into_iter().map(AlertResponse::from).collect(),
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        },
    }))
}
