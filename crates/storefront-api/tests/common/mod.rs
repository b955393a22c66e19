#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use storefront_api::{AppState, AppStateInner, AuthSettings};
use storefront_db::Database;

pub const ADMIN_EMAIL: &str = "admin@shop.test";

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("in-memory database");
        let settings = AuthSettings {
            jwt_secret: "integration-test-secret".into(),
            token_ttl: chrono::Duration::days(1),
            admin_emails: vec![ADMIN_EMAIL.to_string()],
        };
        let state: AppState = Arc::new(AppStateInner::new(db, settings));
        Self {
            router: storefront_api::router(state.clone()),
            state,
        }
    }

    /// Send a request and return the status with the decoded body.
    /// Empty bodies decode to `Value::Null`; non-JSON bodies to a string.
    pub async fn send(
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
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Register an account and return its token.
    pub async fn register(&self, email: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "email": email, "name": name, "password": "correct-horse" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a store and return its id.
    pub async fn create_store(&self, token: &str, name: &str) -> String {
        let (status, body) = self.post("/api/stores", Some(token), json!({ "name": name })).await;
        assert_eq!(status, StatusCode::OK, "create store failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Create a billboard and return its id.
    pub async fn create_billboard(&self, token: &str, store_id: &str, label: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/stores/{}/billboards", store_id),
                Some(token),
                json!({ "label": label, "imageUrl": format!("https://cdn.test/{}.png", label) }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create billboard failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn billboards(&self, store_id: &str) -> Vec<Value> {
        let (status, body) = self.get(&format!("/api/stores/{}/billboards", store_id), None).await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().unwrap().clone()
    }
}
