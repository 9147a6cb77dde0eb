use std::time::Duration;

use tracing::warn;

use crate::upstream::UpstreamError;

/// Total attempts per collaborator fetch (initial call included).
pub const FETCH_ATTEMPTS: u32 = 3;

/// Fixed delay between attempts.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Calls `f` up to [`FETCH_ATTEMPTS`] times with a fixed delay in between.
/// Only errors where [`UpstreamError::is_retryable`] holds trigger another
/// attempt; everything else returns straight away.
pub async fn fetch_with_retry<T, F, Fut>(what: &str, f: F) -> Result<T, UpstreamError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, UpstreamError>>,
{
    for attempt in 1..FETCH_ATTEMPTS {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                warn!(
                    attempt,
                    max_attempts = FETCH_ATTEMPTS,
                    error = %err,
                    "{what} fetch failed, retrying in {RETRY_DELAY:?}"
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(err) => return Err(err),
        }
    }
    // Last attempt, surfaced as-is.
    f().await
}
