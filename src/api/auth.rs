use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use shared::{AppError, AuthService, Result};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::models::{normalize_email, NewUser};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
}

/// Signup endpoint - creates the user and returns a session token
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let email = normalize_email(&payload.email);
    if state.users.find_credentials(&email).await?.is_some() {
        info!("Signup attempt for existing user: {}", email);
        return Err(AppError::conflict("User already exists. Please login"));
    }

    let hashed_password = hash_blocking(&state.auth, payload.password).await?;
    let user_id = uuid::Uuid::new_v4().to_string();

    // the unique email index still rejects a concurrent duplicate here
    state
        .users
        .create_user(NewUser {
            user_id: user_id.clone(),
            email: email.clone(),
            hashed_password,
        })
        .await?;

    let session = state.auth.issue_session_token(&user_id, &email)?;
    info!("New user registered: {} (ID: {})", email, user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: session.token,
            user_id,
        }),
    ))
}

/// Login endpoint - authenticates user and returns a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    if payload.validate().is_err() {
        return Err(AppError::InvalidCredentials);
    }

    let email = normalize_email(&payload.email);

    let Some(credentials) = state.users.find_credentials(&email).await? else {
        info!("Login attempt for non-existent user: {}", email);
        return Err(AppError::InvalidCredentials);
    };

    let auth = state.auth.clone();
    let hash = credentials.hashed_password.clone();
    let password_ok = tokio::task::spawn_blocking(move || auth.verify_password(&payload.password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Password check task failed: {}", e)))?
        // a malformed stored hash is a mismatch, not a server error
        .unwrap_or(false);

    if !password_ok {
        info!("Invalid password for user: {}", email);
        return Err(AppError::InvalidCredentials);
    }

    let session = state
        .auth
        .issue_session_token(&credentials.user_id, &credentials.email)?;

    info!("Successful login for user: {} (ID: {})", email, credentials.user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: session.token,
            user_id: credentials.user_id,
        }),
    ))
}

async fn hash_blocking(auth: &AuthService, password: String) -> Result<String> {
    let auth = auth.clone();
    tokio::task::spawn_blocking(move || auth.hash_password(&password))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))?
}
