// ============================================================================
// SPOTIFY CATALOG SERVICE
// ============================================================================
// Authorization-code flow against the accounts service and top-items reads
// against the web API. Every call carries its token explicitly; the service
// itself holds no user token.
// ============================================================================

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::config::SpotifyConfig;
use shared::{AppError, Result};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::models::catalog::{CatalogArtist, CatalogTrack};
use crate::models::spotify::{AccountsError, Paging};
use crate::models::{RefreshedToken, TokenGrant};
use crate::services::token_refresher::TokenRefresh;

const SERVICE_NAME: &str = "spotify";

/// Scopes requested on the authorization link
pub const AUTHORIZE_SCOPES: [&str; 3] = ["user-read-private", "user-read-email", "user-top-read"];

#[derive(Clone)]
pub struct SpotifyService {
    config: SpotifyConfig,
    http_client: ReqwestClient,
}

impl SpotifyService {
    /// Create a new SpotifyService with its own timeout-bounded HTTP client
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Provider authorization link for the fixed scope set
    pub fn authorize_url(&self) -> Result<String> {
        let base = format!("{}/authorize", self.config.accounts_url.trim_end_matches('/'));
        let scopes = AUTHORIZE_SCOPES.join(" ");

        let url = Url::parse_with_params(
            &base,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", scopes.as_str()),
            ],
        )
        .map_err(|e| AppError::configuration(format!("Invalid accounts URL: {}", e)))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for an access/refresh token pair
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        let start_time = Instant::now();

        let response = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .await
            .map_err(|e| {
                error!(error = %e, "❌ Authorization code exchange request failed");
                AppError::auth_exchange(transport_message(&e))
            })?;

        if !response.status().is_success() {
            let message = accounts_error_message(response).await;
            warn!(error = %message, "🚫 Provider rejected authorization code");
            return Err(AppError::auth_exchange(message));
        }

        let grant: TokenGrant = response.json().await.map_err(|e| {
            error!(error = %e, "❌ Malformed token grant");
            AppError::auth_exchange(format!("Malformed token response: {}", e))
        })?;

        info!(
            token_prefix = %token_prefix(&grant.access_token),
            expires_in = grant.expires_in,
            execution_time_ms = start_time.elapsed().as_millis(),
            "✅ Authorization code exchanged"
        );

        Ok(grant)
    }

    /// Re-issue an access token from a refresh token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshedToken> {
        let response = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await
            .map_err(|e| AppError::upstream(SERVICE_NAME, transport_message(&e)))?;

        if !response.status().is_success() {
            let message = accounts_error_message(response).await;
            return Err(AppError::upstream(SERVICE_NAME, message));
        }

        response
            .json::<RefreshedToken>()
            .await
            .map_err(|e| AppError::upstream(SERVICE_NAME, format!("Malformed refresh response: {}", e)))
    }

    pub async fn fetch_top_artists(&self, access_token: &str) -> Result<Vec<CatalogArtist>> {
        self.fetch_top_items("artists", access_token).await
    }

    pub async fn fetch_top_tracks(&self, access_token: &str) -> Result<Vec<CatalogTrack>> {
        self.fetch_top_items("tracks", access_token).await
    }

    async fn fetch_top_items<T: DeserializeOwned>(
        &self,
        kind: &str,
        access_token: &str,
    ) -> Result<Vec<T>> {
        let url = format!(
            "{}/v1/me/top/{}",
            self.config.api_url.trim_end_matches('/'),
            kind
        );

        debug!(kind = %kind, token_prefix = %token_prefix(access_token), "🎵 Fetching top items");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                error!(kind = %kind, error = %e, "❌ Top items request failed");
                AppError::upstream(SERVICE_NAME, transport_message(&e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(kind = %kind, status = %status, "⚠️ Provider refused top items request");
            return Err(AppError::upstream(SERVICE_NAME, upstream_status_message(status, &body)));
        }

        let page: Paging<T> = response.json().await.map_err(|e| {
            AppError::upstream(SERVICE_NAME, format!("Malformed top {} response: {}", kind, e))
        })?;

        info!(kind = %kind, count = page.items.len(), "✅ Top items fetched");
        Ok(page.items)
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> reqwest::Result<Response> {
        let url = format!("{}/api/token", self.config.accounts_url.trim_end_matches('/'));

        self.http_client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(form)
            .send()
            .await
    }
}

#[async_trait]
impl TokenRefresh for SpotifyService {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken> {
        self.refresh_access_token(refresh_token).await
    }
}

fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

fn transport_message(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Music provider request timed out".to_string()
    } else {
        format!("Music provider unreachable: {}", e)
    }
}

fn upstream_status_message(status: StatusCode, body: &str) -> String {
    match status {
        StatusCode::UNAUTHORIZED => "Access token expired or invalid".to_string(),
        _ if body.is_empty() => format!("Provider returned {}", status),
        _ => format!("Provider returned {}: {}", status, body),
    }
}

async fn accounts_error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<AccountsError>().await {
        Ok(body) => match body.error_description {
            Some(description) => format!("{}: {}", body.error, description),
            None => body.error,
        },
        Err(_) => format!("Provider returned {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_string_contains, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(base_url: &str) -> SpotifyConfig {
        SpotifyConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret-456".to_string(),
            redirect_uri: "http://localhost:8000/callback".to_string(),
            accounts_url: base_url.to_string(),
            api_url: base_url.to_string(),
            request_timeout_seconds: 2,
            session_idle_ttl_seconds: 3600,
        }
    }

    #[test]
    fn test_authorize_url_carries_client_and_scopes() {
        let service = SpotifyService::new(test_config("https://accounts.example.com")).unwrap();
        let url = Url::parse(&service.authorize_url().unwrap()).unwrap();

        assert_eq!(url.path(), "/authorize");
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], "http://localhost:8000/callback");
        assert_eq!(params["scope"], "user-read-private user-read-email user-top-read");
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=good-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-abc",
                "token_type": "Bearer",
                "scope": "user-top-read",
                "expires_in": 3600,
                "refresh_token": "refresh-xyz"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = SpotifyService::new(test_config(&server.uri())).unwrap();
        let grant = service.exchange_code("good-code").await.unwrap();

        assert_eq!(grant.access_token, "access-abc");
        assert_eq!(grant.refresh_token, "refresh-xyz");
        assert_eq!(grant.expires_in, 3600);
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })))
            .mount(&server)
            .await;

        let service = SpotifyService::new(test_config(&server.uri())).unwrap();
        let err = service.exchange_code("bad-code").await.unwrap_err();

        match err {
            AppError::AuthExchange { message } => {
                assert_eq!(message, "invalid_grant: Invalid authorization code")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_top_artists_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/top/artists"))
            .and(header("authorization", "Bearer live-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "name": "A", "images": [], "external_urls": { "spotify": "https://s/a" } },
                    { "name": "B", "images": [], "external_urls": { "spotify": "https://s/b" } }
                ],
                "total": 2
            })))
            .mount(&server)
            .await;

        let service = SpotifyService::new(test_config(&server.uri())).unwrap();
        let artists = service.fetch_top_artists("live-token").await.unwrap();

        let names: Vec<_> = artists.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_fetch_top_tracks_with_expired_token_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/top/tracks"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "status": 401, "message": "The access token expired" }
            })))
            .mount(&server)
            .await;

        let service = SpotifyService::new(test_config(&server.uri())).unwrap();
        let err = service.fetch_top_tracks("stale-token").await.unwrap_err();

        match err {
            AppError::Upstream { message, .. } => {
                assert_eq!(message, "Access token expired or invalid")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-2",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let service = SpotifyService::new(test_config(&server.uri())).unwrap();
        let refreshed = service.refresh("refresh-xyz").await.unwrap();

        assert_eq!(refreshed.access_token, "access-2");
        assert_eq!(refreshed.refresh_token, None);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/top/artists"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "items": [] }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let service = SpotifyService::new(test_config(&server.uri())).unwrap();
        let err = service.fetch_top_artists("token").await.unwrap_err();

        match err {
            AppError::Upstream { message, .. } => {
                assert_eq!(message, "Music provider request timed out")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
