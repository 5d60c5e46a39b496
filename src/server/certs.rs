use std::sync::Arc;

use axum::{Router, extract::State, http::header::CONTENT_TYPE, response::IntoResponse, routing::get};
use chrono::Utc;

use crate::server::AppState;
use crate::server::response::ApiError;
use crate::server::run_blocking;

pub fn certs_router() -> Router<Arc<AppState>> {
    Router::new().route("/certs/pem", get(certificates_pem))
}

/// Every active, unexpired certificate. Registries load this as their token
/// verification bundle.
async fn certificates_pem(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let bundle = run_blocking(move || state.keys.active_certificates(Utc::now())).await?;
    Ok(([(CONTENT_TYPE, "application/x-pem-file")], bundle))
}
