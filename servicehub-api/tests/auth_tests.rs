/// Integration tests for authentication
///
/// - Every catalog endpoint rejects anonymous and malformed credentials with 401
/// - Register, login, refresh and `me` work end to end

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;
use servicehub_shared::auth::jwt::{create_token, Claims, TokenType};
use uuid::Uuid;

#[tokio::test]
async fn test_protected_endpoints_require_auth() {
    let ctx = TestContext::new().await.unwrap();

    let cases = [
        (Method::GET, "/v1/tags"),
        (Method::POST, "/v1/tags"),
        (Method::GET, "/v1/components"),
        (Method::POST, "/v1/components"),
        (Method::GET, "/v1/services"),
        (Method::POST, "/v1/services"),
        (Method::GET, "/v1/services/1"),
        (Method::PATCH, "/v1/services/1"),
        (Method::PUT, "/v1/services/1"),
        (Method::DELETE, "/v1/services/1"),
        (Method::POST, "/v1/services/1/image"),
        (Method::GET, "/v1/auth/me"),
    ];

    for (method, uri) in cases {
        let (status, _) = ctx.request(method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_rejects_invalid_tokens() {
    let ctx = TestContext::new().await.unwrap();

    let refresh = create_token(
        &Claims::new(ctx.alice.user.id, TokenType::Refresh),
        &ctx.config.jwt.secret,
    )
    .unwrap();
    let foreign = create_token(
        &Claims::new(ctx.alice.user.id, TokenType::Access),
        "some-other-secret-that-is-long-enough-too",
    )
    .unwrap();

    for token in ["garbage".to_string(), refresh, foreign] {
        let user = common::TestUser {
            user: ctx.alice.user.clone(),
            token,
        };
        let (status, _) = ctx.get("/v1/tags", &user).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_register_login_refresh_me() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("flow-{}@example.com", Uuid::new_v4());

    let (status, registered) = ctx
        .request(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "email": email, "password": "SecureP4ss", "name": "Flow" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", registered);
    let user_id: Uuid = registered["user_id"].as_str().unwrap().parse().unwrap();

    let (status, _) = ctx
        .request(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "email": email, "password": "SecureP4ss" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": "WrongP4ss" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, tokens) = ctx
        .request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": "SecureP4ss" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, refreshed) = ctx
        .request(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": tokens["refresh_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let me = common::TestUser {
        user: ctx.alice.user.clone(),
        token: refreshed["access_token"].as_str().unwrap().to_string(),
    };
    let (status, profile) = ctx.get("/v1/auth/me", &me).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["id"], user_id.to_string());
    assert_eq!(profile["email"], email);
    assert!(profile["last_login_at"].is_string());
    assert!(profile.get("password_hash").is_none());

    servicehub_shared::models::user::User::delete(&ctx.db, user_id)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "email": "nope", "password": "onlyletters" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = ctx
        .request(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "email": format!("weak-{}@example.com", Uuid::new_v4()), "password": "onlyletters" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
    assert_eq!(body["media"], "available");

    ctx.cleanup().await.unwrap();
}
