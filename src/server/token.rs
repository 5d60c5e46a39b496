use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::response::ApiError;
use crate::server::run_blocking;
use crate::token::{TokenParams, TokenResponse};

pub fn token_router() -> Router<Arc<AppState>> {
    Router::new().route("/token", get(issue_token).post(refresh_token))
}

async fn issue_token(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
) -> Result<Json<TokenResponse>, ApiError> {
    tracing::debug!(
        username = %user.username,
        service = params.service.as_deref().unwrap_or_default(),
        scope = params.scope.as_deref().unwrap_or_default(),
        "token request"
    );

    let response = run_blocking(move || state.issuer.issue(&user, &params, Utc::now())).await?;
    Ok(Json(response))
}

/// OAuth2 refresh-token exchange.
async fn refresh_token() -> ApiError {
    ApiError::not_implemented("token refresh is not implemented")
}
