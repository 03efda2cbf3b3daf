use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tastebook::ai::CannedSuggestionClient;
use tastebook::config::{
    AiConfig, Config, DatabaseConfig, EmailConfig, JwtConfig, MediaConfig, ObservabilityConfig,
    ServerConfig,
};
use tastebook::media::DiskMediaStore;
use tastebook::{create_app, AppState};
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test_secret_key_minimum_32_characters_long".to_string(),
            expiration_days: 7,
            refresh_days: 30,
        },
        email: EmailConfig::default(),
        observability: ObservabilityConfig::default(),
        ai: AiConfig::default(),
        media: MediaConfig::default(),
    }
}

/// App over a fresh in-memory database, with canned AI responses.
pub async fn spawn_app_with_suggestions(responses: Vec<Value>) -> (Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    tastebook_db::migrate(&pool).await.expect("migrate");

    let media_dir = std::env::temp_dir().join(format!(
        "tastebook-test-media-{}",
        tastebook_shared::id::new_object_id()
    ));

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(test_config()),
        suggestions: Arc::new(CannedSuggestionClient::new(responses)),
        media: Arc::new(DiskMediaStore::new(media_dir, "/media")),
    };
    (create_app(state), pool)
}

pub async fn spawn_app() -> (Router, SqlitePool) {
    spawn_app_with_suggestions(vec![]).await
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    app.clone().oneshot(request).await.expect("response")
}

/// POST a raw CSV body, as the admin import endpoints expect.
pub async fn send_csv(app: &Router, uri: &str, token: Option<&str>, csv: &str) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/csv");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(csv.to_string()))
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// Register a user and return `(token, user_id)`.
pub async fn register_user(app: &Router, name: &str, email: &str) -> (String, String) {
    let response = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().expect("token").to_string();
    let user_id = body["data"]["user"]["id"]
        .as_str()
        .expect("user id")
        .to_string();
    (token, user_id)
}

/// Register a user and promote it to admin directly in the store.
pub async fn register_admin(app: &Router, pool: &SqlitePool, email: &str) -> (String, String) {
    let (token, user_id) = register_user(app, "Admin", email).await;
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = ?1")
        .bind(&user_id)
        .execute(pool)
        .await
        .expect("promote admin");
    (token, user_id)
}

/// Create an ingredient through the API and return its id.
pub async fn create_ingredient(app: &Router, token: &str, name: &str, unit: &str) -> String {
    let response = send(
        app,
        "POST",
        "/ingredients",
        Some(token),
        Some(serde_json::json!({ "name": name, "unit": unit })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["id"]
        .as_str()
        .expect("ingredient id")
        .to_string()
}
