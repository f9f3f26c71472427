use std::future::Future;
use std::time::Duration;

use crate::logger;
use crate::utils::errors::ApiError;

/// Attempt budget and linear backoff used for read requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// A non transient failure, returned on the attempt it happened.
    Failed(ApiError),
    Exhausted { attempts: u32, last_error: ApiError },
}

/// Runs `operation` until it succeeds, fails permanently or the attempt budget runs out.
///
/// Attempt `n` that fails transiently waits `n * backoff` before attempt `n + 1`.
pub async fn retry_read<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, RetryOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let attempts = policy.attempts.max(1);
    let mut tries = 0;
    loop {
        tries += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if !error.is_transient() => return Err(RetryOutcome::Failed(error)),
            Err(error) if tries >= attempts => {
                logger!(ERROR, "[API] `{label}` failed after {tries} attempts ({error})");
                return Err(RetryOutcome::Exhausted {
                    attempts: tries,
                    last_error: error,
                });
            }
            Err(error) => {
                logger!(
                    WARN,
                    "[API] `{label}` failed ({error}). Retrying... [{tries}/{attempts}]"
                );
                tokio::time::sleep(policy.backoff * tries).await;
            }
        }
    }
}
