use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::Method,
    response::{IntoResponse, Response},
};

use crate::auth::RequireAdmin;
use crate::rbac::EntityKind;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};
use crate::server::run_blocking;
use crate::server::validation::parse_entity;

/// `/{group:name}/{user:name}/{add-member|remove-member}`. DELETE always
/// removes the membership.
pub(super) async fn membership(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    method: Method,
    Path((subject, member, action)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let group = parse_entity(&subject)?;
    let member = parse_entity(&member)?;
    tracing::debug!(admin = %admin.username, %method, %subject, %action, "admin membership");

    let add = match action.as_str() {
        "add-member" => method == Method::PUT,
        "remove-member" => false,
        other => {
            return Err(ApiError::not_implemented(format!(
                "unsupported action: {other}"
            )));
        }
    };

    if group.kind != EntityKind::Group {
        return Err(ApiError::not_implemented(format!(
            "{action} is only supported on groups"
        )));
    }
    if member.kind != EntityKind::User {
        return Err(ApiError::not_implemented(format!(
            "unsupported member type: {}",
            member.kind
        )));
    }

    run_blocking(move || {
        if add {
            state.rbac.add_member(&group.name, &member.name)
        } else {
            state.rbac.remove_member(&group.name, &member.name)
        }
    })
    .await?;

    Ok(Json(ApiResponse::ok()).into_response())
}
