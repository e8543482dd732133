use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

fn connect_options(db_url: &str) -> ConnectOptions {
    let mut opt = ConnectOptions::new(db_url.to_owned());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);
    opt
}

/// Connect to the relational reference store and sync its schema.
pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(connect_options(db_url)).await?;
    db.get_schema_registry("server::entity::*").sync(&db).await?;
    Ok(db)
}

/// Connect to the document detail store on its own connection.
///
/// Only the document collection schema is synced here; the two stores share
/// no tables and no transactions.
pub async fn init_detail_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(connect_options(db_url)).await?;
    db.get_schema_registry("server::docstore::*")
        .sync(&db)
        .await?;
    Ok(db)
}
