use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

/// Connection to the relational reference store.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Connection to the document detail store. When `url` is absent the server
/// runs with the embedded in-memory store (dev mode; contents do not survive
/// a restart).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DetailStoreConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing secret. Deliberately has no default: startup
    /// fails when it is not configured.
    pub jwt_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AttachmentConfig {
    /// Directory uploaded files are stored under.
    pub root: String,
    /// Maximum accepted upload size in bytes.
    pub max_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Per-call deadline for gateway calls to either store, in milliseconds.
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub detail_store: DetailStoreConfig,
    pub auth: AuthConfig,
    pub attachments: AttachmentConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.access_ttl_minutes", 30)?
            .set_default("auth.refresh_ttl_days", 7)?
            .set_default("attachments.root", "./attachments")?
            .set_default("attachments.max_size", 16 * 1024 * 1024)?
            .set_default("store.timeout_ms", 5000)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., MERITA__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("MERITA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
