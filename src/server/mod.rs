mod admin;
mod certs;
pub mod dto;
pub mod response;
mod router;
mod token;
pub mod validation;

pub use admin::admin_router;
pub use certs::certs_router;
pub use router::{AppState, create_router};
pub use token::token_router;

use response::ApiError;

/// Runs store and hashing work off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            tracing::error!("blocking task failed: {e}");
            ApiError::internal("Internal server error")
        })?
        .map_err(ApiError::from)
}
