use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::RwLock;
use shared::{AppError, Result};
use std::sync::Arc;

use super::{CatalogRepository, MessageRepository, UserRepository, WriteOutcome};
use crate::models::{
    InsertResult, MatchRef, Message, NewUser, ProfileUpdate, TopArtistsRecord, TopTracksRecord,
    UpdateResult, User, UserCredentials,
};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    hashed_password: String,
}

/// In-process store. Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    // keyed by normalized email; the unique index
    users_by_email: Arc<DashMap<String, String>>,
    users: Arc<DashMap<String, StoredUser>>,
    messages: Arc<RwLock<Vec<Message>>>,
    top_artists: Arc<DashMap<String, TopArtistsRecord>>,
    top_tracks: Arc<DashMap<String, TopTracksRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

fn upsert<T: Clone>(map: &DashMap<String, T>, key: &str, record: &T) -> WriteOutcome {
    match map.entry(key.to_string()) {
        Entry::Occupied(mut existing) => {
            existing.insert(record.clone());
            WriteOutcome::Updated
        }
        Entry::Vacant(slot) => {
            slot.insert(record.clone());
            WriteOutcome::Inserted
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<()> {
        match self.users_by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict("User already exists. Please login")),
            Entry::Vacant(slot) => {
                slot.insert(user.user_id.clone());
                self.users.insert(
                    user.user_id.clone(),
                    StoredUser {
                        user: User {
                            user_id: user.user_id,
                            email: user.email,
                            ..User::default()
                        },
                        hashed_password: user.hashed_password,
                    },
                );
                Ok(())
            }
        }
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
        let Some(user_id) = self.users_by_email.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };

        Ok(self.users.get(&user_id).map(|stored| UserCredentials {
            user_id: stored.user.user_id.clone(),
            email: stored.user.email.clone(),
            hashed_password: stored.hashed_password.clone(),
        }))
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.get(user_id).map(|stored| stored.user.clone()))
    }

    async fn find_by_ids(&self, user_ids: &[String]) -> Result<Vec<User>> {
        let mut found: Vec<User> = user_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|stored| stored.user.clone()))
            .collect();
        // Same order as the Postgres store: by user id, duplicates collapsed
        found.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        found.dedup_by(|a, b| a.user_id == b.user_id);
        Ok(found)
    }

    async fn find_by_gender(&self, gender_identity: &str) -> Result<Vec<User>> {
        let mut found: Vec<User> = self
            .users
            .iter()
            .filter(|stored| stored.user.gender_identity.as_deref() == Some(gender_identity))
            .map(|stored| stored.user.clone())
            .collect();
        found.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(found)
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<UpdateResult> {
        let Some(mut stored) = self.users.get_mut(&update.user_id) else {
            return Ok(UpdateResult::from_rows(0));
        };

        let user = &mut stored.user;
        user.first_name = update.first_name;
        user.dob_day = update.dob_day;
        user.dob_month = update.dob_month;
        user.dob_year = update.dob_year;
        user.show_gender = update.show_gender;
        user.gender_identity = update.gender_identity;
        user.gender_interest = update.gender_interest;
        user.url = update.url;
        user.about = update.about;
        if let Some(matches) = update.matches {
            user.matches = matches;
        }

        Ok(UpdateResult::from_rows(1))
    }

    async fn add_match(&self, user_id: &str, matched_user_id: &str) -> Result<UpdateResult> {
        let Some(mut stored) = self.users.get_mut(user_id) else {
            return Ok(UpdateResult::from_rows(0));
        };

        stored.user.matches.push(MatchRef {
            user_id: matched_user_id.to_string(),
        });
        Ok(UpdateResult::from_rows(1))
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn list_messages(&self, from_user_id: &str, to_user_id: &str) -> Result<Vec<Message>> {
        let mut found: Vec<Message> = self
            .messages
            .read()
            .iter()
            .filter(|m| m.from_user_id == from_user_id && m.to_user_id == to_user_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.timestamp);
        Ok(found)
    }

    async fn insert_message(&self, message: Message) -> Result<InsertResult> {
        let id = message.id.clone();
        self.messages.write().push(message);
        Ok(InsertResult::new(id))
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn upsert_top_artists(&self, record: &TopArtistsRecord) -> Result<WriteOutcome> {
        Ok(upsert(&self.top_artists, &record.user_id, record))
    }

    async fn get_top_artists(&self, user_id: &str) -> Result<Option<TopArtistsRecord>> {
        Ok(self.top_artists.get(user_id).map(|r| r.clone()))
    }

    async fn upsert_top_tracks(&self, record: &TopTracksRecord) -> Result<WriteOutcome> {
        Ok(upsert(&self.top_tracks, &record.user_id, record))
    }

    async fn get_top_tracks(&self, user_id: &str) -> Result<Option<TopTracksRecord>> {
        Ok(self.top_tracks.get(user_id).map(|r| r.clone()))
    }
}
