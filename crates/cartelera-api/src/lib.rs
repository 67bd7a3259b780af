pub mod admin;
pub mod announcements;
pub mod auth;
pub mod communities;
pub mod error;
pub mod events;
pub mod media;
pub mod middleware;
pub mod notifications;
pub mod profile;
pub mod reactions;
pub mod validation;

use error::ApiError;

/// Run blocking DB work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}")))?
        .map_err(ApiError::Internal)
}
