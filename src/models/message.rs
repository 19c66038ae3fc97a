use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A direct message between two matched users. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "from_userId")]
    pub from_user_id: String,
    #[serde(rename = "to_userId")]
    pub to_user_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMessage {
    #[serde(rename = "from_userId")]
    #[validate(length(min = 1))]
    pub from_user_id: String,
    #[serde(rename = "to_userId")]
    #[validate(length(min = 1))]
    pub to_user_id: String,
    pub message: String,
    /// Client-side send time; the server clock is used when absent.
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewMessage {
    pub fn into_message(self) -> Message {
        Message {
            id: uuid::Uuid::new_v4().to_string(),
            from_user_id: self.from_user_id,
            to_user_id: self.to_user_id,
            message: self.message,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        }
    }
}
