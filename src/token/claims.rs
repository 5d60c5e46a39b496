use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::ResolvedScope;

/// Lifetime of every issued token.
pub const TOKEN_TTL_SECS: i64 = 300;

/// Query parameters of a token request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenParams {
    pub service: Option<String>,
    pub account: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub access: Vec<ResolvedScope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    /// Same value as `token`, for OAuth2-style clients.
    pub access_token: String,
    pub expires_in: i64,
    pub issued_at: DateTime<Utc>,
}
