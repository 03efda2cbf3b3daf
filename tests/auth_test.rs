mod helpers;

use axum::http::StatusCode;
use helpers::{body_json, register_user, send, spawn_app};
use serde_json::json;

#[tokio::test]
async fn register_then_me_round_trip() {
    let (app, _pool) = spawn_app().await;
    let (token, user_id) = register_user(&app, "Alice", "alice@example.com").await;

    let response = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["id"], json!(user_id));
    assert_eq!(body["data"]["email"], json!("alice@example.com"));
    // The hash must never leave the server.
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_conflict_case_insensitive() {
    let (app, _pool) = spawn_app().await;
    register_user(&app, "Alice", "alice@example.com").await;

    let response = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "name": "Impostor",
            "email": "ALICE@example.com",
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["kind"], json!("conflict"));
}

#[tokio::test]
async fn short_password_is_rejected() {
    let (app, _pool) = spawn_app().await;
    let response = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "short",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let (app, _pool) = spawn_app().await;
    register_user(&app, "Alice", "alice@example.com").await;

    let response = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown email answers identically.
    let response = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_succeeds_and_returns_token() {
    let (app, _pool) = spawn_app().await;
    register_user(&app, "Alice", "alice@example.com").await;

    let response = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().unwrap();

    let response = send(&app, "GET", "/auth/me", Some(token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let (app, _pool) = spawn_app().await;
    let response = send(&app, "GET", "/auth/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, "GET", "/auth/me", Some("garbage-token"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleted_user_token_stops_working() {
    let (app, pool) = spawn_app().await;
    let (token, user_id) = register_user(&app, "Alice", "alice@example.com").await;

    sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(&user_id)
        .execute(&pool)
        .await
        .unwrap();

    let response = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forgot_password_does_not_reveal_accounts() {
    let (app, _pool) = spawn_app().await;
    register_user(&app, "Alice", "alice@example.com").await;

    for email in ["alice@example.com", "nobody@example.com"] {
        let response = send(
            &app,
            "POST",
            "/auth/forgot-password",
            None,
            Some(json!({ "email": email })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn reset_password_with_valid_token() {
    let (app, pool) = spawn_app().await;
    let (_, user_id) = register_user(&app, "Alice", "alice@example.com").await;

    // Plant a reset token the way forgot-password would.
    let expires = tastebook_db::now() + 3600;
    tastebook_db::users::set_reset_token(&pool, &user_id, "testtoken", expires)
        .await
        .unwrap();

    let response = send(
        &app,
        "POST",
        "/auth/reset-password/testtoken",
        None,
        Some(json!({ "password": "newpassword123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works, the new one does.
    let response = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "newpassword123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The token is single-use.
    let response = send(
        &app,
        "POST",
        "/auth/reset-password/testtoken",
        None,
        Some(json!({ "password": "anotherpassword" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_attempts_are_rate_limited_per_client() {
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    let (app, _pool) = spawn_app().await;
    let credentials = json!({ "email": "nobody@example.com", "password": "wrong-password" });

    for _ in 0..10 {
        let response = send(&app, "POST", "/auth/login", None, Some(credentials.clone())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = send(&app, "POST", "/auth/login", None, Some(credentials.clone())).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["error"]["kind"], json!("too_many_requests"));

    // A different client address is not affected.
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("x-forwarded-for", "203.0.113.9")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(credentials.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_endpoints_are_public() {
    let (app, _pool) = spawn_app().await;
    let response = send(&app, "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
