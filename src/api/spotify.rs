use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use shared::{AppError, Result};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::api::users::required;
use crate::models::{CatalogArtist, CatalogTrack};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenQuery {
    pub access_token: Option<String>,
}

/// GET /authenticate - 302 to the provider authorization page
pub async fn authenticate(State(state): State<Arc<AppState>>) -> Result<Response> {
    let url = state.spotify.authorize_url()?;
    Ok(found(&url))
}

/// GET /callback?code= - exchange the code, start the refresher, and send the
/// client app its access token
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if let Some(error) = query.error {
        warn!(error = %error, "🚫 User declined provider authorization");
        return Err(AppError::auth_exchange(error));
    }

    let code = required(query.code, "code")?;
    let grant = state.spotify.exchange_code(&code).await?;
    let session = state.sessions.start(grant);

    let mut redirect = Url::parse(&state.config.app.client_app_url)
        .map_err(|e| AppError::configuration(format!("Invalid CLIENT_APP_URL: {}", e)))?;
    redirect
        .query_pairs_mut()
        .append_pair("access_token", session.handle());

    info!(active_sessions = state.sessions.len(), "✅ Provider session established");
    Ok(found(redirect.as_str()))
}

/// GET /artists?accessToken=
pub async fn top_artists(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccessTokenQuery>,
) -> Result<Json<Vec<CatalogArtist>>> {
    let handle = required(query.access_token, "accessToken")?;
    let token = state.sessions.resolve(&handle);
    Ok(Json(state.spotify.fetch_top_artists(&token).await?))
}

/// GET /songs?accessToken=
pub async fn top_songs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccessTokenQuery>,
) -> Result<Json<Vec<CatalogTrack>>> {
    let handle = required(query.access_token, "accessToken")?;
    let token = state.sessions.resolve(&handle);
    Ok(Json(state.spotify.fetch_top_tracks(&token).await?))
}

/// 302 Found, which `axum::response::Redirect` does not offer
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
