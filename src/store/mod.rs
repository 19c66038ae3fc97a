//! Repository ports for users, messages, and cached catalog records.
//!
//! `PgStore` backs production; `MemoryStore` serves tests and database-less
//! local runs. Both implement every port, so handlers only see trait objects.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::Result;

use crate::models::{
    InsertResult, Message, NewUser, ProfileUpdate, TopArtistsRecord, TopTracksRecord,
    UpdateResult, User, UserCredentials,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Outcome of a catalog cache write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with `AppError::Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<()>;

    /// Look up credentials by (already normalized) email
    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>>;

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>>;

    /// Existing users among `user_ids`, ordered by user id; unknown ids are skipped
    async fn find_by_ids(&self, user_ids: &[String]) -> Result<Vec<User>>;

    async fn find_by_gender(&self, gender_identity: &str) -> Result<Vec<User>>;

    async fn update_profile(&self, update: ProfileUpdate) -> Result<UpdateResult>;

    /// Append `{ user_id: matched_user_id }` to the user's match list
    async fn add_match(&self, user_id: &str, matched_user_id: &str) -> Result<UpdateResult>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Messages sent from `from_user_id` to `to_user_id`, oldest first.
    /// One direction only; a conversation takes two calls.
    async fn list_messages(&self, from_user_id: &str, to_user_id: &str) -> Result<Vec<Message>>;

    async fn insert_message(&self, message: Message) -> Result<InsertResult>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert the record, or overwrite every field of the existing one
    async fn upsert_top_artists(&self, record: &TopArtistsRecord) -> Result<WriteOutcome>;

    async fn get_top_artists(&self, user_id: &str) -> Result<Option<TopArtistsRecord>>;

    async fn upsert_top_tracks(&self, record: &TopTracksRecord) -> Result<WriteOutcome>;

    async fn get_top_tracks(&self, user_id: &str) -> Result<Option<TopTracksRecord>>;
}
