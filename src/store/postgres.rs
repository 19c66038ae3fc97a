use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{AppError, Result};
use sqlx::{types::Json as SqlxJson, FromRow, PgPool};
use tracing::{debug, error};

use super::{CatalogRepository, MessageRepository, UserRepository, WriteOutcome};
use crate::models::catalog::{ArtistRef, Image};
use crate::models::{
    InsertResult, MatchRef, Message, NewUser, ProfileUpdate, TopArtistsRecord, TopTracksRecord,
    UpdateResult, User, UserCredentials,
};

const USER_COLUMNS: &str = r#"
    user_id, email, first_name, dob_day, dob_month, dob_year, show_gender,
    gender_identity, gender_interest, url, about, matches
"#;

/// Postgres-backed store sharing one connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// ROW MAPPINGS
// ============================================================================

#[derive(Debug, FromRow)]
struct UserRow {
    user_id: String,
    email: String,
    first_name: Option<String>,
    dob_day: Option<String>,
    dob_month: Option<String>,
    dob_year: Option<String>,
    show_gender: Option<bool>,
    gender_identity: Option<String>,
    gender_interest: Option<String>,
    url: Option<String>,
    about: Option<String>,
    matches: SqlxJson<Vec<MatchRef>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            email: row.email,
            first_name: row.first_name,
            dob_day: row.dob_day,
            dob_month: row.dob_month,
            dob_year: row.dob_year,
            show_gender: row.show_gender,
            gender_identity: row.gender_identity,
            gender_interest: row.gender_interest,
            url: row.url,
            about: row.about,
            matches: row.matches.0,
        }
    }
}

#[derive(Debug, FromRow)]
struct CredentialsRow {
    user_id: String,
    email: String,
    hashed_password: String,
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: String,
    from_user_id: String,
    to_user_id: String,
    message: String,
    sent_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            from_user_id: row.from_user_id,
            to_user_id: row.to_user_id,
            message: row.message,
            timestamp: row.sent_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TopArtistsRow {
    user_id: String,
    artist_name: SqlxJson<Vec<String>>,
    artist_images: SqlxJson<Vec<Option<String>>>,
    artist_urls: SqlxJson<Vec<Option<String>>>,
}

impl From<TopArtistsRow> for TopArtistsRecord {
    fn from(row: TopArtistsRow) -> Self {
        TopArtistsRecord {
            user_id: row.user_id,
            artist_name: row.artist_name.0,
            artist_images: row.artist_images.0,
            artist_urls: row.artist_urls.0,
        }
    }
}

#[derive(Debug, FromRow)]
struct TopTracksRow {
    user_id: String,
    tracks_name: SqlxJson<Vec<String>>,
    track_artists: SqlxJson<Vec<Vec<ArtistRef>>>,
    track_urls: SqlxJson<Vec<Option<String>>>,
    track_preview_url: SqlxJson<Vec<Option<String>>>,
    track_img: SqlxJson<Vec<Vec<Image>>>,
}

impl From<TopTracksRow> for TopTracksRecord {
    fn from(row: TopTracksRow) -> Self {
        TopTracksRecord {
            user_id: row.user_id,
            tracks_name: row.tracks_name.0,
            track_artists: row.track_artists.0,
            track_urls: row.track_urls.0,
            track_preview_url: row.track_preview_url.0,
            track_img: row.track_img.0,
        }
    }
}

/// `xmax = 0` only holds for a row version created by this statement's insert
#[derive(Debug, FromRow)]
struct UpsertRow {
    inserted: bool,
}

impl From<UpsertRow> for WriteOutcome {
    fn from(row: UpsertRow) -> Self {
        if row.inserted {
            WriteOutcome::Inserted
        } else {
            WriteOutcome::Updated
        }
    }
}

// ============================================================================
// USERS
// ============================================================================

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (user_id, email, hashed_password)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!(email = %user.email, "Signup rejected by unique email index");
                Err(AppError::conflict("User already exists. Please login"))
            }
            Err(e) => {
                error!("Error inserting user: {}", e);
                Err(AppError::Database(e))
            }
        }
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserCredentials {
            user_id: r.user_id,
            email: r.email,
            hashed_password: r.hashed_password,
        }))
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_ids(&self, user_ids: &[String]) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE user_id = ANY($1) ORDER BY user_id",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_by_gender(&self, gender_identity: &str) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE gender_identity = $1 ORDER BY user_id",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(gender_identity)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<UpdateResult> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                first_name = $2,
                dob_day = $3,
                dob_month = $4,
                dob_year = $5,
                show_gender = $6,
                gender_identity = $7,
                gender_interest = $8,
                url = $9,
                about = $10,
                matches = COALESCE($11, matches),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(&update.user_id)
        .bind(&update.first_name)
        .bind(&update.dob_day)
        .bind(&update.dob_month)
        .bind(&update.dob_year)
        .bind(update.show_gender)
        .bind(&update.gender_identity)
        .bind(&update.gender_interest)
        .bind(&update.url)
        .bind(&update.about)
        .bind(update.matches.map(SqlxJson))
        .execute(&self.pool)
        .await?;

        Ok(UpdateResult::from_rows(result.rows_affected()))
    }

    async fn add_match(&self, user_id: &str, matched_user_id: &str) -> Result<UpdateResult> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET matches = matches || jsonb_build_array(jsonb_build_object('user_id', $2::text)),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(matched_user_id)
        .execute(&self.pool)
        .await?;

        Ok(UpdateResult::from_rows(result.rows_affected()))
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

#[async_trait]
impl MessageRepository for PgStore {
    async fn list_messages(&self, from_user_id: &str, to_user_id: &str) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, from_user_id, to_user_id, message, sent_at
            FROM messages
            WHERE from_user_id = $1 AND to_user_id = $2
            ORDER BY sent_at ASC
            "#,
        )
        .bind(from_user_id)
        .bind(to_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn insert_message(&self, message: Message) -> Result<InsertResult> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, from_user_id, to_user_id, message, sent_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&message.id)
        .bind(&message.from_user_id)
        .bind(&message.to_user_id)
        .bind(&message.message)
        .bind(message.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(InsertResult::new(message.id))
    }
}

// ============================================================================
// CATALOG CACHE
// ============================================================================

#[async_trait]
impl CatalogRepository for PgStore {
    async fn upsert_top_artists(&self, record: &TopArtistsRecord) -> Result<WriteOutcome> {
        let row = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO spotify_top_artists (user_id, artist_name, artist_images, artist_urls)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                artist_name = EXCLUDED.artist_name,
                artist_images = EXCLUDED.artist_images,
                artist_urls = EXCLUDED.artist_urls,
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&record.user_id)
        .bind(SqlxJson(&record.artist_name))
        .bind(SqlxJson(&record.artist_images))
        .bind(SqlxJson(&record.artist_urls))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_top_artists(&self, user_id: &str) -> Result<Option<TopArtistsRecord>> {
        let row = sqlx::query_as::<_, TopArtistsRow>(
            r#"
            SELECT user_id, artist_name, artist_images, artist_urls
            FROM spotify_top_artists
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TopArtistsRecord::from))
    }

    async fn upsert_top_tracks(&self, record: &TopTracksRecord) -> Result<WriteOutcome> {
        let row = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO spotify_top_tracks
                (user_id, tracks_name, track_artists, track_urls, track_preview_url, track_img)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                tracks_name = EXCLUDED.tracks_name,
                track_artists = EXCLUDED.track_artists,
                track_urls = EXCLUDED.track_urls,
                track_preview_url = EXCLUDED.track_preview_url,
                track_img = EXCLUDED.track_img,
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&record.user_id)
        .bind(SqlxJson(&record.tracks_name))
        .bind(SqlxJson(&record.track_artists))
        .bind(SqlxJson(&record.track_urls))
        .bind(SqlxJson(&record.track_preview_url))
        .bind(SqlxJson(&record.track_img))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_top_tracks(&self, user_id: &str) -> Result<Option<TopTracksRecord>> {
        let row = sqlx::query_as::<_, TopTracksRow>(
            r#"
            SELECT user_id, tracks_name, track_artists, track_urls, track_preview_url, track_img
            FROM spotify_top_tracks
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TopTracksRecord::from))
    }
}
