#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tollgate::config::ServerConfig;
use tollgate::id::IdGenerator;
use tollgate::server::{AppState, create_router};
use tollgate::store::{SqliteStore, Store};

pub const ADMIN: (&str, &str) = ("admin", "admin-secret");

/// An in-process server over a temporary database with a bootstrapped admin
/// and a generated EC P-256 credential.
pub struct TestApp {
    _temp: TempDir,
    pub state: Arc<AppState>,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("parse response body")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("utf-8 body")
    }
}

impl TestApp {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp.path().join("test.db")).expect("open store");
        store.initialize().expect("initialize store");

        let config = ServerConfig {
            root_user: Some(ADMIN.0.to_string()),
            root_password: Some(ADMIN.1.to_string()),
            ..ServerConfig::default()
        };

        let ids = Arc::new(IdGenerator::new(1).expect("id generator"));
        let state = Arc::new(AppState::new(Arc::new(store), ids, &config));
        state
            .rbac
            .bootstrap_principals(config.root_credentials())
            .expect("bootstrap principals");
        state.keys.bootstrap(Utc::now()).expect("bootstrap pki");

        let router = create_router(Arc::clone(&state));
        Self {
            _temp: temp,
            state,
            router,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        auth: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((username, password)) = auth {
            builder = builder.header(header::AUTHORIZATION, basic(username, password));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).expect("build request")).await
    }

    pub async fn admin(&self, method: Method, path: &str, body: Option<Value>) -> TestResponse {
        self.request(method, &format!("/v2/admin{path}"), Some(ADMIN), body)
            .await
    }

    /// Creates a user through the admin API.
    pub async fn add_user(&self, username: &str, password: &str) {
        let resp = self
            .admin(
                Method::PUT,
                &format!("/user:{username}/add"),
                Some(serde_json::json!({ "password": password })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.text());
    }

    pub async fn token(&self, auth: (&str, &str), query: &str) -> TestResponse {
        self.request(Method::GET, &format!("/v2/token?{query}"), Some(auth), None)
            .await
    }
}

pub fn basic(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{username}:{password}"))
    )
}

/// Decodes one JWT segment without verifying the signature.
pub fn jwt_segment(token: &str, index: usize) -> Value {
    let segment = token.split('.').nth(index).expect("jwt segment");
    let bytes = URL_SAFE_NO_PAD.decode(segment).expect("base64url segment");
    serde_json::from_slice(&bytes).expect("json segment")
}
