use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use shared::{AppError, Result};
use std::sync::Arc;

use crate::api::users::required;
use crate::models::catalog::{SyncResponse, TopArtistsSyncRequest, TopSongsSyncRequest};
use crate::models::{SyncStatus, TopArtistsRecord, TopTracksRecord};
use crate::services::UpsertOutcome;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CachedQuery {
    pub user_id: Option<String>,
}

/// POST /top-artists { user_id, TopArtistList }
pub async fn sync_top_artists(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TopArtistsSyncRequest>,
) -> Result<(StatusCode, Json<SyncResponse<TopArtistsRecord>>)> {
    let outcome = state
        .catalog_cache
        .sync_top_artists(&payload.user_id, &payload.top_artist_list)
        .await?;

    Ok(sync_response(outcome))
}

/// POST /top-songs { user_id, TopSongsList }
pub async fn sync_top_songs(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TopSongsSyncRequest>,
) -> Result<(StatusCode, Json<SyncResponse<TopTracksRecord>>)> {
    let outcome = state
        .catalog_cache
        .sync_top_tracks(&payload.user_id, &payload.top_songs_list)
        .await?;

    Ok(sync_response(outcome))
}

/// GET /get-artists?user_id=
pub async fn get_cached_artists(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CachedQuery>,
) -> Result<Json<TopArtistsRecord>> {
    let user_id = required(query.user_id, "user_id")?;

    state
        .catalog_cache
        .top_artists(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("top artists for {}", user_id)))
}

/// GET /get-songs?user_id=
pub async fn get_cached_songs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CachedQuery>,
) -> Result<Json<TopTracksRecord>> {
    let user_id = required(query.user_id, "user_id")?;

    state
        .catalog_cache
        .top_tracks(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("top songs for {}", user_id)))
}

fn sync_response<T: Serialize>(outcome: UpsertOutcome<T>) -> (StatusCode, Json<SyncResponse<T>>) {
    let status = outcome.status();
    let (code, message) = match status {
        SyncStatus::Inserted => (StatusCode::CREATED, "Top items cached"),
        SyncStatus::Updated => (StatusCode::OK, "Top items updated"),
        SyncStatus::Stale => (
            StatusCode::OK,
            "Access token expired or no items returned, cached record left unchanged",
        ),
    };

    (
        code,
        Json(SyncResponse {
            status,
            message: message.to_string(),
            record: outcome.into_record(),
        }),
    )
}
