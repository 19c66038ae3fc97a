//! Database connection pooling

use crate::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

/// Create the shared PostgreSQL pool.
///
/// Connections are checked out per query and returned to the pool when the
/// borrowing future completes, on success and error paths alike.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        "🔧 Creating database pool with {} max connections",
        config.max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    info!("✅ Database pool created successfully");
    Ok(pool)
}
