use std::sync::Arc;

use common::store::{DetailStore, ReferenceStore};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::lifecycle::LifecycleCoordinator;
use crate::revocation::RevocationSet;

#[derive(Clone)]
pub struct AppState {
    /// Relational reference store connection (also holds users, profiles,
    /// roles and integrity alerts).
    pub db: DatabaseConnection,
    pub references: Arc<dyn ReferenceStore>,
    pub details: Arc<dyn DetailStore>,
    pub coordinator: Arc<LifecycleCoordinator>,
    pub revoked: Arc<RevocationSet>,
    pub config: AppConfig,
}
