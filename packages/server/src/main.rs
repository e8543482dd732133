use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::store::memory::MemoryDetailStore;
use common::store::{DetailStore, ReferenceStore};
use tracing::{Level, info, warn};

use server::config::AppConfig;
use server::docstore::SqlDetailStore;
use server::integrity::{IntegritySink, SqlIntegritySink};
use server::lifecycle::LifecycleCoordinator;
use server::revocation::RevocationSet;
use server::state::AppState;
use server::store::SqlReferenceStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    // Missing signing secret is fatal here, by design.
    let config = AppConfig::load()
        .context("configuration error (is MERITA__AUTH__JWT_SECRET set?)")?;

    let db = server::database::init_db(&config.database.url)
        .await
        .context("reference store connection failed")?;
    server::seed::seed_role_permissions(&db).await?;
    server::seed::ensure_indexes(&db).await?;

    let timeout = Duration::from_millis(config.store.timeout_ms);

    let references: Arc<dyn ReferenceStore> =
        Arc::new(SqlReferenceStore::new(db.clone(), timeout));

    let details: Arc<dyn DetailStore> = match &config.detail_store.url {
        Some(url) => {
            let detail_db = server::database::init_detail_db(url)
                .await
                .context("detail store connection failed")?;
            Arc::new(SqlDetailStore::new(detail_db, timeout))
        }
        None => {
            warn!("No detail store configured; using the embedded in-memory store");
            Arc::new(MemoryDetailStore::new())
        }
    };

    let alerts: Arc<dyn IntegritySink> = Arc::new(SqlIntegritySink::new(db.clone()));
    let coordinator = Arc::new(LifecycleCoordinator::new(
        Arc::clone(&references),
        Arc::clone(&details),
        alerts,
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        db,
        references,
        details,
        coordinator,
        revoked: Arc::new(RevocationSet::new()),
        config,
    };

    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
