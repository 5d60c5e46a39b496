use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::auth::BASIC_CHALLENGE;
use crate::error::Error;

/// Standard API response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: Vec::new(),
        }
    }
}

impl ApiResponse<()> {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            errors: vec![message.into()],
        }
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    #[must_use]
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    #[must_use]
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_IMPLEMENTED, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Unauthenticated => Self::unauthorized("Invalid credentials"),
            Error::Forbidden => Self::new(StatusCode::FORBIDDEN, "Forbidden"),
            Error::NotFound(what) => Self::not_found(what),
            Error::Validation(msg) => Self::bad_request(msg),
            Error::ScopeFormat(scope) => Self::bad_request(format!("invalid scope: {scope}")),
            Error::UnsupportedAlgorithm(name) => {
                tracing::error!("unsupported signing algorithm: {name}");
                Self::internal(format!("unsupported signing algorithm: {name}"))
            }
            Error::Database(e) => {
                tracing::error!("database error: {e}");
                Self::internal("Database error")
            }
            e => {
                tracing::error!("{e}");
                Self::internal("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::error(self.message);
        let mut response = (self.status, Json(body)).into_response();

        if self.status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static(BASIC_CHALLENGE),
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let ok = serde_json::to_value(ApiResponse::ok()).unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true }));

        let data = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(data, serde_json::json!({ "success": true, "data": [1, 2] }));

        let err = serde_json::to_value(ApiResponse::error("nope")).unwrap();
        assert_eq!(err, serde_json::json!({ "success": false, "errors": ["nope"] }));
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (Error::Unauthenticated, StatusCode::UNAUTHORIZED),
            (Error::Forbidden, StatusCode::FORBIDDEN),
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::Validation("x".into()), StatusCode::BAD_REQUEST),
            (Error::ScopeFormat("x".into()), StatusCode::BAD_REQUEST),
            (Error::NoActiveCredential, StatusCode::INTERNAL_SERVER_ERROR),
            (Error::UnsupportedAlgorithm("ES224".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_unsupported_algorithm_message_is_distinct() {
        let generic = ApiError::from(Error::Signing("boom".into()));
        let algorithm = ApiError::from(Error::UnsupportedAlgorithm("ES224".into()));
        assert_ne!(generic.message, algorithm.message);
        assert!(algorithm.message.contains("ES224"));
    }
}
