use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// USER DOCUMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRef {
    pub user_id: String,
}

/// Public user document. The password hash never leaves the store layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub dob_day: Option<String>,
    pub dob_month: Option<String>,
    pub dob_year: Option<String>,
    pub show_gender: Option<bool>,
    pub gender_identity: Option<String>,
    pub gender_interest: Option<String>,
    /// Profile photo URL
    pub url: Option<String>,
    /// Free-form bio
    pub about: Option<String>,
    #[serde(default)]
    pub matches: Vec<MatchRef>,
}

/// Credential view used by login
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: String,
    pub email: String,
    pub hashed_password: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub email: String,
    pub hashed_password: String,
}

/// Profile fields written by `PUT /users`.
///
/// Every profile field is overwritten; `matches` is only replaced when present.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1))]
    pub user_id: String,
    pub first_name: Option<String>,
    pub dob_day: Option<String>,
    pub dob_month: Option<String>,
    pub dob_year: Option<String>,
    pub show_gender: Option<bool>,
    pub gender_identity: Option<String>,
    pub gender_interest: Option<String>,
    pub url: Option<String>,
    pub about: Option<String>,
    pub matches: Option<Vec<MatchRef>>,
}

// ============================================================================
// WRITE RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateResult {
    pub fn from_rows(rows: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count: rows,
            modified_count: rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertResult {
    pub fn new(inserted_id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            inserted_id: inserted_id.into(),
        }
    }
}

/// Emails are stored and compared lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
