use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::authz::{Action, authorize, resolve_actor};
use crate::error::{AppError, ErrorBody};
use crate::extractors::AuthUser;
use crate::models::stats::StatsOverviewResponse;
use crate::state::AppState;
use crate::stats;

/// Composite statistics over both stores.
#[utoipa::path(
    get,
    path = "/overview",
    tag = "Statistics",
    operation_id = "statsOverview",
    summary = "Achievement statistics overview",
    description = "Status histogram, 12-month submission trend, top verified students, and \
        distributions by type, event year and competition level. Sub-queries fan out \
        concurrently; any failure fails the whole response naming the sub-query. Requires \
        `stats:read` permission.",
    responses(
        (status = 200, description = "Merged statistics", body = StatsOverviewResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 500, description = "A sub-query failed (PARTIAL_AGGREGATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn stats_overview(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatsOverviewResponse>, AppError> {
    let actor = resolve_actor(&state.db, &auth_user).await?;
    authorize(&actor, Action::ViewStats, None)?;

    let overview = stats::overview(state.references.as_ref(), state.details.as_ref()).await?;
    Ok(Json(overview.into()))
}
