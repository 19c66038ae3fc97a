use shared::config::StorageBackend;
use shared::{AuthService, Config};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::services::{CatalogCache, SessionRegistry, SpotifyService};
use crate::store::{CatalogRepository, MemoryStore, MessageRepository, PgStore, UserRepository};

/// Shared application state.
/// Holds the repositories, the provider client, and the live provider sessions.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub users: Arc<dyn UserRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub catalog_cache: CatalogCache,
    pub spotify: SpotifyService,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Build state for the configured storage backend.
    /// The Postgres backend connects its pool and applies pending migrations.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        match config.app.storage_backend {
            StorageBackend::Postgres => {
                let pool = shared::database::create_pool(&config.database).await?;

                info!("🗄️ Running database migrations...");
                sqlx::migrate!("./migrations").run(&pool).await?;
                info!("✅ Migrations complete");

                Self::with_store(config, PgStore::new(pool))
            }
            StorageBackend::Memory => {
                if config.is_production() {
                    anyhow::bail!("STORAGE_BACKEND=memory is not allowed in production");
                }
                info!("ℹ️ STORAGE_BACKEND=memory, data will not survive a restart");
                Self::with_store(config, MemoryStore::new())
            }
        }
    }

    /// Build state over any store implementing every repository port
    pub fn with_store<S>(config: Config, store: S) -> anyhow::Result<Self>
    where
        S: UserRepository + MessageRepository + CatalogRepository + Clone + 'static,
    {
        let auth = AuthService::new(&config.auth)?;
        let spotify = SpotifyService::new(config.spotify.clone())?;
        let sessions = SessionRegistry::new(
            Arc::new(spotify.clone()),
            Duration::from_secs(config.spotify.session_idle_ttl_seconds),
        );

        Ok(Self {
            config: Arc::new(config),
            auth,
            users: Arc::new(store.clone()),
            messages: Arc::new(store.clone()),
            catalog_cache: CatalogCache::new(Arc::new(store)),
            spotify,
            sessions,
        })
    }
}
