//! HTTP handlers

pub mod health;
pub mod records;
pub mod categories;
pub mod features;
pub mod models;
pub mod results;
pub mod analysis;
pub mod events;

use crate::AppResult;

/// Run store / engine work off the async runtime
pub async fn blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> wearwatch_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}
