#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] runs the REAL kernel routes and services over in-memory
//! stores and the tower-sessions memory store, so no PostgreSQL or Redis is
//! needed. Every test builds its own app; nothing is shared between tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::cookie::SameSite;

use inkwell_kernel::models::Role;
use inkwell_kernel::{AppState, Config, routes, session};
use inkwell_test_utils::{TEST_PASSWORD, credentials};

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

/// A buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    /// `name=value` of the session cookie, when the response set one.
    pub cookie: Option<String>,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("response body is UTF-8")
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let state = AppState::in_memory(&config)
            .await
            .expect("failed to build in-memory state");

        let router = routes::router()
            .layer(session::memory_session_layer(SameSite::Lax, false))
            .with_state(state.clone());

        Self { router, state }
    }

    /// Send a request, optionally with a JSON body and a session cookie.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let body = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            content_type,
            cookie,
            body,
        }
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::GET, path, None, cookie).await
    }

    pub async fn post(&self, path: &str, body: &Value, cookie: Option<&str>) -> TestResponse {
        self.send(Method::POST, path, Some(body), cookie).await
    }

    pub async fn put(&self, path: &str, body: &Value, cookie: Option<&str>) -> TestResponse {
        self.send(Method::PUT, path, Some(body), cookie).await
    }

    pub async fn delete(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, path, None, cookie).await
    }

    /// Whitelist `email` with `role`, sign up through the API and return the
    /// session cookie.
    pub async fn sign_up_as(&self, email: &str, role: Role) -> String {
        self.state
            .auth()
            .whitelist_add(email, role)
            .await
            .expect("failed to whitelist test user");

        let response = self
            .post("/api/auth/signup", &credentials(email, TEST_PASSWORD), None)
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.cookie.expect("signup sets a session cookie")
    }

    pub async fn editor(&self) -> String {
        self.sign_up_as("editor@example.com", Role::Editor).await
    }

    pub async fn admin(&self) -> String {
        self.sign_up_as("admin@example.com", Role::Admin).await
    }

    pub async fn reader(&self) -> String {
        self.sign_up_as("reader@example.com", Role::Reader).await
    }
}
