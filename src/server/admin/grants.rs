use std::sync::Arc;

use axum::{
    Json,
    http::Method,
    response::{IntoResponse, Response},
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};
use crate::server::run_blocking;
use crate::server::validation::{parse_entity, parse_grant};

/// PUT grants (upsert), DELETE revokes (exact match, absent is fine).
pub(super) async fn permission(
    RequireAdmin(admin): RequireAdmin,
    state: Arc<AppState>,
    method: Method,
    subject: String,
    target: String,
) -> Result<Response, ApiError> {
    let entity = parse_entity(&subject)?;
    let spec = parse_grant(&target)?;
    tracing::debug!(admin = %admin.username, %method, %subject, %target, "admin permission");

    let grant = method == Method::PUT;
    run_blocking(move || {
        let owner = state.rbac.resolve_owner(entity.kind, &entity.name)?;
        if grant {
            state.rbac.grant(owner, &spec)
        } else {
            state.rbac.revoke(owner, &spec).map(|_| ())
        }
    })
    .await?;

    Ok(Json(ApiResponse::ok()).into_response())
}
