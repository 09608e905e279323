//! Bounded execution of CPU-bound work on the blocking pool.

use crate::error::TokenError;
use std::time::Duration;

/// Run `work` on the blocking pool and wait at most `limit` for it.
///
/// On timeout the caller gets [`TokenError::Timeout`]; the blocking task
/// itself runs to completion in the background.
pub async fn run_bounded<T, F>(operation: &'static str, limit: Duration, work: F) -> Result<T, TokenError>
where
    F: FnOnce() -> Result<T, TokenError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(TokenError::internal(format!(
            "{operation} task failed: {join_error}"
        ))),
        Err(_) => Err(TokenError::Timeout {
            operation,
            duration: limit,
        }),
    }
}
