// Response hardening and cross-origin policy for the client app
use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;
use url::Url;

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

/// CORS for the single-page client. Only the scheme, host and port of
/// `client_app_url` form the allowed origin; an unparsable URL falls back to
/// allowing any origin so local setups keep working.
pub fn get_cors_layer(client_app_url: &str) -> CorsLayer {
    let allow_origin = match client_origin(client_app_url) {
        Some(value) => AllowOrigin::exact(value),
        None => {
            warn!(url = %client_app_url, "⚠️ CLIENT_APP_URL has no usable origin, allowing any");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

fn client_origin(client_app_url: &str) -> Option<HeaderValue> {
    let origin = Url::parse(client_app_url).ok()?.origin();
    if !origin.is_tuple() {
        return None;
    }
    HeaderValue::from_str(&origin.ascii_serialization()).ok()
}
