use axum::routing::{get, post};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/achievements", achievement_routes(config))
        .nest("/students", student_routes())
        .nest("/users", user_routes())
        .nest("/stats", stats_routes())
        .nest("/alerts", alert_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
}

fn achievement_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            handlers::achievement::list_achievements,
            handlers::achievement::create_achievement
        ))
        .routes(routes!(
            handlers::achievement::get_achievement,
            handlers::achievement::update_achievement,
            handlers::achievement::delete_achievement
        ))
        .routes(routes!(handlers::achievement::submit_achievement))
        .routes(routes!(handlers::achievement::verify_achievement))
        .routes(routes!(handlers::achievement::reject_achievement));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::achievement::upload_attachment))
        .layer(handlers::achievement::attachment_body_limit(
            config.attachments.max_size,
        ));

    crud.merge(upload)
}

fn student_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::student::list_students))
        .routes(routes!(handlers::student::update_advisor))
        .routes(routes!(handlers::student::student_report))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::user::create_user))
}

fn stats_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::stats::stats_overview))
}

fn alert_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::alert::list_alerts))
}
