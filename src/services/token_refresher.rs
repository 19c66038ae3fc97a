// ============================================================================
// PROVIDER SESSIONS & TOKEN REFRESHER
// ============================================================================
// Each completed authorization handshake becomes a `CatalogSession` with its
// own token slot. A `TokenRefresher` keeps that slot fresh:
//
//   Active --(refresh ok, every expires_in / 4)--> Active
//   Active --(refresh failed)--> Stopped   (no retry, no backoff)
//   Active --(unused for idle_ttl)--> Stopped
//
// Sessions live in memory only; a restart forces re-authorization.
// ============================================================================

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use shared::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::models::{RefreshedToken, TokenGrant};

/// Minimum delay between two refreshes, whatever the provider's `expires_in`
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Anything that can trade a refresh token for a new access token
#[async_trait]
pub trait TokenRefresh: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefresherState {
    Active,
    Stopped,
}

/// Refresh cadence for a token living `expires_in` seconds
pub fn refresh_interval(expires_in: u64) -> Duration {
    Duration::from_millis(expires_in.saturating_mul(1000) / 4).max(MIN_REFRESH_INTERVAL)
}

pub struct CatalogSession {
    handle: String,
    access_token: RwLock<String>,
    refresh_token: RwLock<String>,
    refresh_interval: RwLock<Duration>,
    idle_ttl: Duration,
    last_used: Mutex<Instant>,
    state: RwLock<RefresherState>,
    refresh_count: AtomicU64,
}

impl CatalogSession {
    /// A session stops once nobody has resolved it for `idle_ttl`
    pub fn new(grant: TokenGrant, idle_ttl: Duration) -> Self {
        Self {
            handle: grant.access_token.clone(),
            refresh_interval: RwLock::new(refresh_interval(grant.expires_in)),
            idle_ttl,
            last_used: Mutex::new(Instant::now()),
            access_token: RwLock::new(grant.access_token),
            refresh_token: RwLock::new(grant.refresh_token),
            state: RwLock::new(RefresherState::Active),
            refresh_count: AtomicU64::new(0),
        }
    }

    /// The access token first handed to the client; identifies the session
    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn access_token(&self) -> String {
        self.access_token.read().clone()
    }

    pub fn state(&self) -> RefresherState {
        *self.state.read()
    }

    /// Tracks the lifetime of the most recently issued access token
    pub fn refresh_interval(&self) -> Duration {
        *self.refresh_interval.read()
    }

    pub fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }

    pub fn is_idle(&self) -> bool {
        self.last_used.lock().elapsed() >= self.idle_ttl
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        *self.state.write() = RefresherState::Stopped;
    }
}

pub struct TokenRefresher {
    session: Arc<CatalogSession>,
    provider: Arc<dyn TokenRefresh>,
}

impl TokenRefresher {
    pub fn new(session: Arc<CatalogSession>, provider: Arc<dyn TokenRefresh>) -> Self {
        Self { session, provider }
    }

    /// Perform one transition of the state machine
    pub async fn tick(&self) -> RefresherState {
        if self.session.state() == RefresherState::Stopped {
            return RefresherState::Stopped;
        }

        if self.session.is_idle() {
            info!(
                idle_ttl_secs = self.session.idle_ttl.as_secs(),
                "💤 Provider session idle, stopping refresher"
            );
            self.session.stop();
            return RefresherState::Stopped;
        }

        let refresh_token = self.session.refresh_token.read().clone();

        match self.provider.refresh(&refresh_token).await {
            Ok(refreshed) => {
                *self.session.access_token.write() = refreshed.access_token;
                if let Some(rotated) = refreshed.refresh_token {
                    *self.session.refresh_token.write() = rotated;
                }
                *self.session.refresh_interval.write() = refresh_interval(refreshed.expires_in);
                let count = self.session.refresh_count.fetch_add(1, Ordering::Relaxed) + 1;
                info!(refresh_count = count, "🔄 Provider access token refreshed");
                // A concurrent stop() wins over a refresh that was already in flight
                self.session.state()
            }
            Err(e) => {
                warn!(error = %e, "🛑 Provider token refresh failed, stopping refresher");
                self.session.stop();
                RefresherState::Stopped
            }
        }
    }

    /// Sleep one interval between ticks until the session stops
    pub async fn run(self) {
        loop {
            tokio::time::sleep(self.session.refresh_interval()).await;
            if self.tick().await == RefresherState::Stopped {
                break;
            }
        }
    }
}

/// Live provider sessions keyed by their handle
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, Arc<CatalogSession>>>,
    provider: Arc<dyn TokenRefresh>,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(provider: Arc<dyn TokenRefresh>, idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            provider,
            idle_ttl,
        }
    }

    /// Register a freshly granted session and start its refresher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, grant: TokenGrant) -> Arc<CatalogSession> {
        let session = Arc::new(CatalogSession::new(grant, self.idle_ttl));
        let handle = session.handle().to_string();

        if let Some(previous) = self.sessions.insert(handle.clone(), session.clone()) {
            previous.stop();
        }

        info!(
            interval_secs = session.refresh_interval().as_secs(),
            "⏰ Token refresher scheduled"
        );

        let refresher = TokenRefresher::new(session.clone(), self.provider.clone());
        let sessions = self.sessions.clone();
        let owned = session.clone();
        tokio::spawn(async move {
            refresher.run().await;
            sessions.remove_if(&handle, |_, current| Arc::ptr_eq(current, &owned));
        });

        session
    }

    /// Current access token for a session handle; unknown handles pass through.
    /// Resolving a session keeps it from going idle.
    pub fn resolve(&self, token: &str) -> String {
        match self.sessions.get(token) {
            Some(session) => {
                session.touch();
                session.access_token()
            }
            None => token.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
