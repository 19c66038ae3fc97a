use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use shared::{AppError, Result};
use std::sync::Arc;
use validator::Validate;

use crate::api::users::required;
use crate::models::{InsertResult, Message, NewMessage};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub user_id: Option<String>,
    pub corresponding_user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: NewMessage,
}

/// GET /messages?userId=&correspondingUserId=
///
/// Returns only messages sent by `userId` to `correspondingUserId`.
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>> {
    let from = required(query.user_id, "userId")?;
    let to = required(query.corresponding_user_id, "correspondingUserId")?;

    Ok(Json(state.messages.list_messages(&from, &to).await?))
}

/// POST /message { message }
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<InsertResult>> {
    payload
        .message
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let message = payload.message.into_message();
    Ok(Json(state.messages.insert_message(message).await?))
}
