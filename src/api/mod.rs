pub mod auth;
pub mod catalog;
pub mod messages;
pub mod root;
pub mod spotify;
pub mod users;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root::root))
        .route("/health", get(root::health))
        // Accounts
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        // Profiles and matches
        .route("/user", get(users::get_user))
        .route("/users", get(users::get_users).put(users::update_user))
        .route("/gendered-users", get(users::get_gendered_users))
        .route("/addmatch", put(users::add_match))
        // Direct messages
        .route("/messages", get(messages::get_messages))
        .route("/message", post(messages::send_message))
        // Music provider handshake and live catalog
        .route("/authenticate", get(spotify::authenticate))
        .route("/callback", get(spotify::callback))
        .route("/artists", get(spotify::top_artists))
        .route("/songs", get(spotify::top_songs))
        // Catalog cache
        .route("/top-artists", post(catalog::sync_top_artists))
        .route("/top-songs", post(catalog::sync_top_songs))
        .route("/get-artists", get(catalog::get_cached_artists))
        .route("/get-songs", get(catalog::get_cached_songs))
}
