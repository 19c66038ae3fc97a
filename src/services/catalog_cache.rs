//! Per-user cache of top artists and top tracks.
//!
//! Upsert policy:
//! - project the first five items into parallel field arrays
//! - non-empty projection: insert, or overwrite every field of the existing record
//! - empty projection: write nothing and report `Stale`, whether or not a record exists

use shared::{AppError, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::catalog::CacheRecord;
use crate::models::{CatalogArtist, CatalogTrack, SyncStatus, TopArtistsRecord, TopTracksRecord};
use crate::store::{CatalogRepository, WriteOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome<T> {
    Inserted(T),
    Updated(T),
    Stale,
}

impl<T> UpsertOutcome<T> {
    pub fn status(&self) -> SyncStatus {
        match self {
            UpsertOutcome::Inserted(_) => SyncStatus::Inserted,
            UpsertOutcome::Updated(_) => SyncStatus::Updated,
            UpsertOutcome::Stale => SyncStatus::Stale,
        }
    }

    pub fn into_record(self) -> Option<T> {
        match self {
            UpsertOutcome::Inserted(record) | UpsertOutcome::Updated(record) => Some(record),
            UpsertOutcome::Stale => None,
        }
    }
}

#[derive(Clone)]
pub struct CatalogCache {
    repository: Arc<dyn CatalogRepository>,
}

impl CatalogCache {
    pub fn new(repository: Arc<dyn CatalogRepository>) -> Self {
        Self { repository }
    }

    pub async fn sync_top_artists(
        &self,
        user_id: &str,
        items: &[CatalogArtist],
    ) -> Result<UpsertOutcome<TopArtistsRecord>> {
        let Some(record) = prepare(TopArtistsRecord::project(user_id, items), "artists")? else {
            return Ok(UpsertOutcome::Stale);
        };

        let outcome = self.repository.upsert_top_artists(&record).await?;
        Ok(finish(outcome, record, "artists"))
    }

    pub async fn sync_top_tracks(
        &self,
        user_id: &str,
        items: &[CatalogTrack],
    ) -> Result<UpsertOutcome<TopTracksRecord>> {
        let Some(record) = prepare(TopTracksRecord::project(user_id, items), "tracks")? else {
            return Ok(UpsertOutcome::Stale);
        };

        let outcome = self.repository.upsert_top_tracks(&record).await?;
        Ok(finish(outcome, record, "tracks"))
    }

    pub async fn top_artists(&self, user_id: &str) -> Result<Option<TopArtistsRecord>> {
        self.repository.get_top_artists(user_id).await
    }

    pub async fn top_tracks(&self, user_id: &str) -> Result<Option<TopTracksRecord>> {
        self.repository.get_top_tracks(user_id).await
    }
}

fn prepare<R: CacheRecord>(record: R, kind: &str) -> Result<Option<R>> {
    if record.user_id().trim().is_empty() {
        return Err(AppError::validation("user_id is required"));
    }

    if record.is_empty() {
        warn!(
            user_id = %record.user_id(),
            kind = %kind,
            "⚠️ No top items to cache, access token likely expired"
        );
        return Ok(None);
    }

    Ok(Some(record))
}

fn finish<R: CacheRecord>(outcome: WriteOutcome, record: R, kind: &str) -> UpsertOutcome<R> {
    info!(user_id = %record.user_id(), kind = %kind, outcome = ?outcome, "💾 Top items cached");

    match outcome {
        WriteOutcome::Inserted => UpsertOutcome::Inserted(record),
        WriteOutcome::Updated => UpsertOutcome::Updated(record),
    }
}
