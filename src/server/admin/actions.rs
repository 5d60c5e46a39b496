use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::RequireAdmin;
use crate::rbac::EntityKind;
use crate::server::AppState;
use crate::server::dto::PasswordRequest;
use crate::server::response::{ApiError, ApiResponse};
use crate::server::run_blocking;
use crate::server::validation::parse_entity;

fn password_body(body: &Bytes) -> Result<PasswordRequest, ApiError> {
    if body.is_empty() {
        return Ok(PasswordRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid body: {e}")))
}

pub(super) async fn action(
    RequireAdmin(admin): RequireAdmin,
    state: Arc<AppState>,
    subject: String,
    action: String,
    body: Bytes,
) -> Result<Response, ApiError> {
    let entity = parse_entity(&subject)?;
    tracing::debug!(admin = %admin.username, %subject, %action, "admin action");

    let name = entity.name;
    match (entity.kind, action.as_str()) {
        (EntityKind::User, "add") => {
            let req = password_body(&body)?;
            let user = run_blocking(move || {
                state
                    .rbac
                    .create_user(&name, &req.password, false)
                    .map(|(user, _)| user)
            })
            .await?;
            Ok((StatusCode::CREATED, Json(ApiResponse::success(user))).into_response())
        }
        (EntityKind::Group, "add") => {
            let (group, _) = run_blocking(move || state.rbac.create_group(&name)).await?;
            Ok((StatusCode::CREATED, Json(ApiResponse::success(group))).into_response())
        }
        (kind, "remove") => {
            run_blocking(move || state.rbac.remove(kind, &name)).await?;
            Ok(Json(ApiResponse::ok()).into_response())
        }
        (kind, "enable") => {
            run_blocking(move || state.rbac.set_active(kind, &name, true)).await?;
            Ok(Json(ApiResponse::ok()).into_response())
        }
        (kind, "disable") => {
            run_blocking(move || state.rbac.set_active(kind, &name, false)).await?;
            Ok(Json(ApiResponse::ok()).into_response())
        }
        (EntityKind::User, "change-password") => {
            let req = password_body(&body)?;
            run_blocking(move || state.rbac.change_password(&name, &req.password)).await?;
            Ok(Json(ApiResponse::ok()).into_response())
        }
        (kind, "permissions") => {
            let grants = run_blocking(move || state.rbac.permissions(kind, &name)).await?;
            Ok(Json(ApiResponse::success(grants)).into_response())
        }
        (kind, other) => Err(ApiError::not_implemented(format!(
            "unsupported action for {kind}: {other}"
        ))),
    }
}
