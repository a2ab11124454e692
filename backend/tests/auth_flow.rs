mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;

#[tokio::test]
async fn signup_then_login_yields_accepted_token() {
    let app = TestApp::new();
    let (status, body) = app.signup("u1", "p1", "9876543210").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User registered successfully");

    let (status, body) = app.login("u1", "p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "u1");
    assert_eq!(body["user"]["phone"], "9876543210");
    assert!(body["user"].get("passwordHash").is_none());
    let token = body["token"].as_str().unwrap();

    let (status, body) = app.call(Method::GET, "/profile", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "u1");
    assert_eq!(body["user"]["email"], "u1@example.com");
}

#[tokio::test]
async fn duplicate_username_or_email_is_rejected() {
    let app = TestApp::new();
    assert_eq!(app.signup("u1", "p1", "1").await.0, StatusCode::OK);

    let (status, body) = app.signup("u1", "other", "2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");

    // Same email under a new username.
    let (status, _) = app
        .call(
            Method::POST,
            "/signup",
            None,
            Some(serde_json::json!({
                "username": "u2",
                "password": "p2",
                "email": "u1@example.com",
                "name": "Second",
                "phone": "3",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Neither rejected signup left a user behind.
    assert_eq!(app.login("u2", "p2").await.0, StatusCode::NOT_FOUND);
    assert_eq!(app.login("u1", "other").await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("u1", "p1").await.0, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_gets_no_token() {
    let app = TestApp::new();
    app.signup("u1", "p1", "1").await;

    let (status, body) = app.login("u1", "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());

    let (status, _) = app.login("ghost", "p1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_routes_distinguish_missing_and_invalid_tokens() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token missing");

    let (status, body) = app.call(Method::GET, "/api/offers", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn signup_with_missing_fields_is_a_validation_error() {
    let app = TestApp::new();
    let (status, body) = app
        .call(
            Method::POST,
            "/signup",
            None,
            Some(serde_json::json!({"username": "u1", "password": "p1"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email is required");
}

#[tokio::test]
async fn health_check_lists_endpoints() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["endpoints"]["auth"]["login"], "/login");
}

#[tokio::test]
async fn token_of_a_deleted_user_is_rejected() {
    let app = TestApp::new();
    let token = app.register("u1", "1").await;
    assert_eq!(app.call(Method::GET, "/profile", Some(&token), None).await.0, StatusCode::OK);

    app.delete_user("u1");

    let (status, body) = app.call(Method::GET, "/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid token");
}
