use serde::{Deserialize, Serialize};

/// Token pair returned by the authorization-code exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of `access_token` in seconds
    pub expires_in: u64,
}

/// Response of a refresh-token grant. The provider may rotate the refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

/// Page envelope used by the provider's list endpoints
#[derive(Debug, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Error body of the accounts service (`/api/token`)
#[derive(Debug, Deserialize)]
pub struct AccountsError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}
