mod actions;
mod grants;
mod members;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::Method,
    response::Response,
};
use axum::body::Bytes;
use axum::routing::put;

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::response::ApiError;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{subject}/{target}", put(subject_target).delete(subject_target))
        .route(
            "/{subject}/{member}/{action}",
            put(members::membership).delete(members::membership),
        )
}

/// `{target}` is either a permission (`type:name:action`) or an action word.
async fn subject_target(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    method: Method,
    Path((subject, target)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, ApiError> {
    if target.contains(':') {
        grants::permission(admin, state, method, subject, target).await
    } else if method == Method::PUT {
        actions::action(admin, state, subject, target, body).await
    } else {
        Err(ApiError::not_implemented(format!(
            "unsupported method {method} for action {target}"
        )))
    }
}
