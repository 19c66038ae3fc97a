use axum::{middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod models;
pub mod security;
pub mod services;
pub mod state;
pub mod store;

use api::create_api_router;
use security::{get_cors_layer, security_headers_middleware};
use state::AppState;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    let cors = get_cors_layer(&app_state.config.app.client_app_url);

    create_api_router()
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(security_headers_middleware))
}
