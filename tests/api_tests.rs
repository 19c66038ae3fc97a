use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rhythmatch_ws::{create_app_router, state::AppState, store::MemoryStore};
use serde_json::{json, Value};
use shared::config::{AppConfig, AuthConfig, DatabaseConfig, SpotifyConfig, StorageBackend};
use shared::Config;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{
    matchers::{body_string_contains, header as header_eq, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn test_config(provider_url: &str) -> Config {
    Config {
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout_seconds: 1,
            idle_timeout_seconds: 1,
            max_lifetime_seconds: 1,
        },
        auth: AuthConfig {
            jwt_secret: "integration-test-secret".to_string(),
            session_token_ttl_seconds: 86_400,
            bcrypt_cost: 4,
        },
        spotify: SpotifyConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret-456".to_string(),
            redirect_uri: "http://localhost:8000/callback".to_string(),
            accounts_url: provider_url.to_string(),
            api_url: provider_url.to_string(),
            request_timeout_seconds: 2,
            session_idle_ttl_seconds: 3600,
        },
        app: AppConfig {
            environment: "test".to_string(),
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            client_app_url: "http://localhost:3000".to_string(),
            storage_backend: StorageBackend::Memory,
        },
    }
}

fn test_app(provider_url: &str) -> Router {
    let state = AppState::with_store(test_config(provider_url), MemoryStore::new()).unwrap();
    create_app_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn signup(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/signup",
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

fn artists(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "name": format!("Artist {}", i),
                "images": [{ "url": format!("https://img/{}", i), "height": 640, "width": 640 }],
                "external_urls": { "spotify": format!("https://open/{}", i) },
                "popularity": 50 + i,
            })
        })
        .collect()
}

#[tokio::test]
async fn root_greets_and_health_reports_sessions() {
    let app = test_app("http://127.0.0.1:9");

    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Hello to my App"));

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_provider_sessions"], 0);
}

#[tokio::test]
async fn signup_rejects_duplicate_email_in_any_case() {
    let app = test_app("http://127.0.0.1:9");

    let (status, body) = signup(&app, "Ana@Example.com", "pw1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["token"].as_str().unwrap().is_empty());
    let auth = shared::AuthService::new(&test_config("http://127.0.0.1:9").auth).unwrap();
    let claims = auth.validate_token(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, body["user_id"].as_str().unwrap());
    assert_eq!(claims.email, "ana@example.com");

    let (status, body) = signup(&app, "ana@example.com", "other").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");
}

#[tokio::test]
async fn login_checks_password_and_normalizes_email() {
    let app = test_app("http://127.0.0.1:9");
    let (_, created) = signup(&app, "ana@example.com", "pw1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        Some(json!({ "email": "ANA@example.com", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], created["user_id"]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        Some(json!({ "email": "ana@example.com", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_CREDENTIALS");

    let (status, _) = send(
        &app,
        Method::POST,
        "/login",
        Some(json!({ "email": "ghost@example.com", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_update_match_and_lookup() {
    let app = test_app("http://127.0.0.1:9");
    let (_, ana) = signup(&app, "ana@example.com", "pw1").await;
    let (_, bo) = signup(&app, "bo@example.com", "pw2").await;
    let ana_id = ana["user_id"].as_str().unwrap();
    let bo_id = bo["user_id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/users",
        Some(json!({ "formData": {
            "user_id": ana_id,
            "first_name": "Ana",
            "gender_identity": "woman",
            "gender_interest": "man",
            "about": "vinyl collector",
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched_count"], 1);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/addmatch",
        Some(json!({ "userId": ana_id, "matchedUserId": bo_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, user) = send(&app, Method::GET, &format!("/user?userId={}", ana_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["first_name"], "Ana");
    assert_eq!(user["matches"], json!([{ "user_id": bo_id }]));
    assert!(user.get("hashed_password").is_none());

    let (status, women) = send(&app, Method::GET, "/gendered-users?gender=woman", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(women.as_array().unwrap().len(), 1);

    let ids = serde_json::to_string(&json!([ana_id, bo_id])).unwrap();
    let encoded: String = url::form_urlencoded::byte_serialize(ids.as_bytes()).collect();
    let uri = format!("/users?userIds={}", encoded);
    let (status, users) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::GET, "/user?userId=missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/users?userIds=not-json", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn messages_are_listed_one_direction_in_send_order() {
    let app = test_app("http://127.0.0.1:9");

    for (from, to, text, ts) in [
        ("a", "b", "first", "2024-03-01T10:00:00Z"),
        ("b", "a", "reply", "2024-03-01T10:01:00Z"),
        ("a", "b", "second", "2024-03-01T10:02:00Z"),
    ] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/message",
            Some(json!({ "message": {
                "from_userId": from,
                "to_userId": to,
                "message": text,
                "timestamp": ts,
            }})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["acknowledged"], true);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/messages?userId=a&correspondingUserId=b",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["message"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["first", "second"]);

    let (status, _) = send(&app, Method::GET, "/messages?userId=a", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn top_artists_cache_keeps_first_five_and_ignores_empty_lists() {
    let app = test_app("http://127.0.0.1:9");

    let (status, body) = send(
        &app,
        Method::POST,
        "/top-artists",
        Some(json!({ "user_id": "u1", "TopArtistList": artists(6) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "inserted");

    let (status, cached) = send(&app, Method::GET, "/get-artists?user_id=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    let names = cached["artist_name"].as_array().unwrap();
    assert_eq!(names.len(), 5);
    assert_eq!(names[0], "Artist 0");
    assert_eq!(cached["artist_images"][0], "https://img/0");
    assert_eq!(cached["artist_urls"][4], "https://open/4");

    let (status, body) = send(
        &app,
        Method::POST,
        "/top-artists",
        Some(json!({ "user_id": "u1", "TopArtistList": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "stale");

    let (_, unchanged) = send(&app, Method::GET, "/get-artists?user_id=u1", None).await;
    assert_eq!(unchanged, cached);

    let (status, body) = send(
        &app,
        Method::POST,
        "/top-artists",
        Some(json!({ "user_id": "u1", "TopArtistList": artists(2) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "updated");
    assert_eq!(body["record"]["artist_name"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::GET, "/get-artists?user_id=nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn top_songs_cache_round_trip() {
    let app = test_app("http://127.0.0.1:9");
    let track = json!({
        "name": "Song",
        "artists": [{ "name": "Band" }],
        "external_urls": { "spotify": "https://open/track" },
        "preview_url": null,
        "album": { "images": [{ "url": "https://img/cover", "height": 300, "width": 300 }] },
    });

    let (status, _) = send(
        &app,
        Method::POST,
        "/top-songs",
        Some(json!({ "user_id": "u1", "TopSongsList": [track] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, cached) = send(&app, Method::GET, "/get-songs?user_id=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cached["tracks_name"], json!(["Song"]));
    assert_eq!(cached["track_artists"][0][0]["name"], "Band");
    assert_eq!(cached["track_preview_url"], json!([null]));
    assert_eq!(cached["track_img"][0][0]["url"], "https://img/cover");
}

#[tokio::test]
async fn live_catalog_requires_access_token() {
    let app = test_app("http://127.0.0.1:9");

    for uri in ["/artists", "/songs", "/artists?accessToken="] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "MISSING_PARAMETER");
    }
}

#[tokio::test]
async fn authenticate_redirects_to_provider() {
    let app = test_app("https://accounts.example.com");

    let response = app
        .oneshot(Request::builder().uri("/authenticate").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://accounts.example.com/authorize?"));
    assert!(location.contains("client_id=client-123"));
}

#[tokio::test]
async fn callback_hands_token_to_client_and_serves_live_artists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("code=good-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-abc",
            "refresh_token": "refresh-xyz",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/artists"))
        .and(header_eq("authorization", "Bearer access-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": artists(3) })))
        .mount(&server)
        .await;

    let app = test_app(&server.uri());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/callback?code=good-code")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "http://localhost:3000/?access_token=access-abc"
    );

    let (_, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health["active_provider_sessions"], 1);

    let (status, body) = send(&app, Method::GET, "/artists?accessToken=access-abc", None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["name"], "Artist 0");
    assert_eq!(items[0]["popularity"], 50);
}

#[tokio::test]
async fn callback_without_code_or_with_rejected_code_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid authorization code",
        })))
        .mount(&server)
        .await;

    let app = test_app(&server.uri());

    let (status, body) = send(&app, Method::GET, "/callback", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_PARAMETER");

    let (status, body) = send(&app, Method::GET, "/callback?code=bad", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AUTH_EXCHANGE_ERROR");
}

#[tokio::test]
async fn memory_store_is_refused_in_production() {
    let mut config = test_config("http://127.0.0.1:9");
    config.app.environment = "production".to_string();
    assert!(AppState::new(config).await.is_err());

    let config = test_config("http://127.0.0.1:9");
    assert!(AppState::new(config).await.is_ok());
}
