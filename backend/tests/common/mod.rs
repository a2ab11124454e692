//! Shared harness: a fresh SQLite file and upload dir per test, driven through the real router.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use diesel::prelude::*;
use http_body_util::BodyExt;
use marketplace::schema::users;
use marketplace::{app, AppConfig, AppState};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "marketplace-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    db_path: PathBuf,
    // Dropped last so the database file outlives the pool.
    dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp directory");
        let db_path = dir.path().join("marketplace.db");
        let config = AppConfig {
            bind_host: [127, 0, 0, 1].into(),
            port: 0,
            database_url: db_path.to_string_lossy().into_owned(),
            jwt_secret: "test-signing-secret".into(),
            token_ttl_secs: 3600,
            bcrypt_cost: 4,
            upload_dir: dir.path().join("uploads"),
            max_upload_bytes: 10 * 1024 * 1024,
            db_pool_size: 4,
        };
        let state = AppState::new(config).expect("failed to build app state");
        Self { router: app(state.clone()), state, db_path, dir }
    }

    /// Removes a user row directly, leaving any issued tokens in circulation.
    pub fn delete_user(&self, username: &str) {
        let mut conn = SqliteConnection::establish(&self.db_path.to_string_lossy())
            .expect("failed to open test database");
        let deleted = diesel::delete(users::table.filter(users::username.eq(username)))
            .execute(&mut conn)
            .expect("failed to delete user");
        assert_eq!(deleted, 1, "no user named {}", username);
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("router failed");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body failed").to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.expect("router failed");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body failed").to_bytes();
        (status, bytes.to_vec())
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("invalid request");
        self.send(request).await
    }

    pub async fn signup(&self, username: &str, password: &str, phone: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            "/signup",
            None,
            Some(json!({
                "username": username,
                "password": password,
                "email": format!("{}@example.com", username),
                "name": format!("{} Name", username),
                "phone": phone,
            })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": username, "password": password})),
        )
        .await
    }

    /// Signs up and logs in, returning the bearer token.
    pub async fn register(&self, username: &str, phone: &str) -> String {
        let (status, _) = self.signup(username, "secret-pass", phone).await;
        assert_eq!(status, StatusCode::OK, "signup of {} failed", username);
        let (status, body) = self.login(username, "secret-pass").await;
        assert_eq!(status, StatusCode::OK, "login of {} failed", username);
        body["token"].as_str().expect("token missing").to_string()
    }

    pub async fn post_listing(
        &self,
        token: Option<&str>,
        fields: &[(&str, &str)],
        images: &[(&str, &[u8])],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        for (file_name, bytes) in images {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                    BOUNDARY, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/properties")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body)).expect("invalid request")).await
    }

    /// Lists a flat with the standard client field names and returns its id.
    pub async fn list_flat(&self, token: &str, title: &str) -> String {
        let (status, body) = self
            .post_listing(
                Some(token),
                &[
                    ("title", title),
                    ("category", "Flat"),
                    ("price", "4500000"),
                    ("location", "Hyderabad"),
                    ("rooms", "3"),
                    ("sqft", "1200"),
                ],
                &[],
            )
            .await;
        assert_eq!(status, StatusCode::OK, "listing failed: {}", body);
        body["id"].as_str().expect("property id missing").to_string()
    }
}
