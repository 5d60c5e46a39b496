use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::{Credentials, CredentialsError, parse_authorization, verify_basic};
use crate::error::Error;
use crate::server::AppState;
use crate::types::User;

pub const BASIC_CHALLENGE: &str = "Basic realm=\"tollgate\"";

/// Extractor that requires valid Basic credentials.
pub struct RequireUser(pub User);

/// Extractor that requires Basic credentials of an admin user.
pub struct RequireAdmin(pub User);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidCredentials,
    BearerNotSupported,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::BearerNotSupported => (
                StatusCode::NOT_IMPLEMENTED,
                "Bearer authentication is not implemented",
            ),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "success": false, "errors": [message] });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static(BASIC_CHALLENGE),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = extract_and_verify_user(parts, state).await?;
        Ok(RequireUser(user))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = extract_and_verify_user(parts, state).await?;

        if !user.admin {
            tracing::debug!(username = %user.username, "admin access denied");
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(user))
    }
}

/// Password hashing and the user lookup run on the blocking pool.
async fn extract_and_verify_user(parts: &Parts, state: &Arc<AppState>) -> Result<User, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let credentials = parse_authorization(auth_header)
        .map_err(|e| match e {
            CredentialsError::InvalidScheme => AuthError::InvalidScheme,
            CredentialsError::Malformed => AuthError::InvalidCredentials,
        })?
        .ok_or(AuthError::MissingAuth)?;

    let (username, password) = match credentials {
        Credentials::Basic { username, password } => (username, password),
        Credentials::Bearer(_) => return Err(AuthError::BearerNotSupported),
    };

    let state = Arc::clone(state);
    let verified = tokio::task::spawn_blocking(move || {
        verify_basic(state.store.as_ref(), &state.hasher, &username, &password)
    })
    .await
    .map_err(|e| {
        tracing::error!("credential verification task failed: {e}");
        AuthError::InternalError
    })?;

    verified.map_err(|e| match e {
        Error::Unauthenticated => AuthError::InvalidCredentials,
        e => {
            tracing::error!("failed to verify credentials: {e}");
            AuthError::InternalError
        }
    })
}
