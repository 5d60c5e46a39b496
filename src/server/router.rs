use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Json, Router, routing::get};
use uuid::Uuid;

use super::admin::admin_router;
use super::certs::certs_router;
use super::dto::ServiceInfo;
use super::token::token_router;
use crate::auth::PasswordHasher;
use crate::config::ServerConfig;
use crate::id::IdGenerator;
use crate::pki::KeyLifecycleManager;
use crate::rbac::RbacEngine;
use crate::store::Store;
use crate::token::TokenIssuer;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub hasher: Arc<PasswordHasher>,
    pub ids: Arc<IdGenerator>,
    pub keys: Arc<KeyLifecycleManager>,
    pub issuer: TokenIssuer,
    pub rbac: RbacEngine,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, ids: Arc<IdGenerator>, config: &ServerConfig) -> Self {
        let hasher = Arc::new(PasswordHasher::new());
        let keys = Arc::new(KeyLifecycleManager::new(
            store.clone(),
            ids.clone(),
            config.pki.clone(),
        ));

        Self {
            issuer: TokenIssuer::new(config.issuer.clone(), store.clone(), keys.clone()),
            rbac: RbacEngine::new(store.clone(), hasher.clone(), ids.clone()),
            store,
            hasher,
            ids,
            keys,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn log_request(request: Request, next: Next) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
    let start = Instant::now();

    let mut response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        request_id = %request_id,
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .nest(
            "/v2",
            token_router()
                .merge(certs_router())
                .nest("/admin", admin_router()),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
