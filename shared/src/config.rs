//! Configuration management for the RhythMatch backend

use serde::{Deserialize, Serialize};
use std::env;

/// Secret used only when `JWT_SECRET` is absent outside production.
pub const DEVELOPMENT_JWT_SECRET: &str = "rhythmatch-development-secret-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub spotify: SpotifyConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_token_ttl_seconds: u64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub accounts_url: String,
    pub api_url: String,
    pub request_timeout_seconds: u64,
    /// Provider sessions nobody has used for this long stop refreshing
    pub session_idle_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
    pub client_app_url: String,
    pub storage_backend: StorageBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown STORAGE_BACKEND: {}", other)),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if is_production_environment(&environment) => {
                anyhow::bail!("JWT_SECRET must be set in production");
            }
            _ => DEVELOPMENT_JWT_SECRET.to_string(),
        };

        Ok(Config {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost:5432/rhythmatch".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()?,
                acquire_timeout_seconds: env::var("DATABASE_ACQUIRE_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                idle_timeout_seconds: env::var("DATABASE_IDLE_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()?,
                max_lifetime_seconds: env::var("DATABASE_MAX_LIFETIME_SECONDS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()?,
            },
            auth: AuthConfig {
                jwt_secret,
                session_token_ttl_seconds: env::var("SESSION_TOKEN_TTL_SECONDS")
                    .unwrap_or_else(|_| "86400".to_string())
                    .parse()?,
                bcrypt_cost: env::var("BCRYPT_COST")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            spotify: SpotifyConfig {
                client_id: env::var("SPOTIFY_CLIENT_ID")
                    .map_err(|_| anyhow::anyhow!("SPOTIFY_CLIENT_ID must be set"))?,
                client_secret: env::var("SPOTIFY_CLIENT_SECRET")
                    .map_err(|_| anyhow::anyhow!("SPOTIFY_CLIENT_SECRET must be set"))?,
                redirect_uri: env::var("SPOTIFY_REDIRECT_URI")
                    .map_err(|_| anyhow::anyhow!("SPOTIFY_REDIRECT_URI must be set"))?,
                accounts_url: env::var("SPOTIFY_ACCOUNTS_URL")
                    .unwrap_or_else(|_| "https://accounts.spotify.com".to_string()),
                api_url: env::var("SPOTIFY_API_URL")
                    .unwrap_or_else(|_| "https://api.spotify.com".to_string()),
                request_timeout_seconds: env::var("UPSTREAM_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                session_idle_ttl_seconds: env::var("SPOTIFY_SESSION_IDLE_TTL_SECONDS")
                    .unwrap_or_else(|_| "86400".to_string())
                    .parse()?,
            },
            app: AppConfig {
                environment,
                log_level: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "rhythmatch_ws=info,tower_http=info".to_string()),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                client_app_url: env::var("CLIENT_APP_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                storage_backend: env::var("STORAGE_BACKEND")
                    .unwrap_or_else(|_| "postgres".to_string())
                    .parse()?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        is_production_environment(&self.app.environment)
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn is_production_environment(environment: &str) -> bool {
    environment.eq_ignore_ascii_case("production")
}
