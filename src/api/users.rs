use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use shared::{AppError, Result};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::models::{ProfileUpdate, UpdateResult, User};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersQuery {
    /// JSON-encoded array of user ids, e.g. `["a","b"]`
    pub user_ids: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenderQuery {
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(rename = "formData")]
    pub form_data: ProfileUpdate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMatchRequest {
    pub user_id: String,
    pub matched_user_id: String,
}

/// GET /user?userId=
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<User>> {
    let user_id = required(query.user_id, "userId")?;

    state
        .users
        .find_by_id(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("user {}", user_id)))
}

/// GET /users?userIds=["a","b"]
pub async fn get_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<User>>> {
    let raw = required(query.user_ids, "userIds")?;
    let user_ids: Vec<String> = serde_json::from_str(&raw)
        .map_err(|e| AppError::validation(format!("userIds must be a JSON array of strings: {}", e)))?;

    debug!(count = user_ids.len(), "Fetching users by id");
    Ok(Json(state.users.find_by_ids(&user_ids).await?))
}

/// GET /gendered-users?gender=
pub async fn get_gendered_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GenderQuery>,
) -> Result<Json<Vec<User>>> {
    let gender = required(query.gender, "gender")?;
    Ok(Json(state.users.find_by_gender(&gender).await?))
}

/// PUT /users { formData }
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UpdateResult>> {
    payload
        .form_data
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    Ok(Json(state.users.update_profile(payload.form_data).await?))
}

/// PUT /addmatch { userId, matchedUserId }
pub async fn add_match(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddMatchRequest>,
) -> Result<Json<UpdateResult>> {
    if payload.user_id.is_empty() || payload.matched_user_id.is_empty() {
        return Err(AppError::validation("userId and matchedUserId are required"));
    }

    Ok(Json(
        state
            .users
            .add_match(&payload.user_id, &payload.matched_user_id)
            .await?,
    ))
}

/// Missing and empty query parameters are treated alike
pub(crate) fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::missing_parameter(name))
}
