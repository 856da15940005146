//! Backoff for idempotent storage reads.
//!
//! A read is re-sent only when the node could not be reached at all. A
//! request that timed out has already used up part of the caller's deadline
//! and is handed back as is, and so is any HTTP response, error statuses
//! included. Writes never go through here.

use std::future::Future;
use std::time::Duration;

/// Retry schedule: `retries` extra attempts, the delay doubling from `base`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Backoff {
    retries: u32,
    base: Duration,
}

/// Schedule used for `cat`: 200ms, 400ms, 800ms.
pub(crate) const READ_BACKOFF: Backoff = Backoff::new(3, Duration::from_millis(200));

fn worth_retrying(error: &reqwest::Error) -> bool {
    error.is_connect() && !error.is_timeout()
}

impl Backoff {
    pub(crate) const fn new(retries: u32, base: Duration) -> Self {
        Self { retries, base }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Send through `f`, re-sending after connection failures.
    pub(crate) async fn send<F, Fut>(
        &self,
        operation: &'static str,
        f: F,
    ) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Err(e) if attempt < self.retries && worth_retrying(&e) => {
                    let delay = self.delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        operation,
                        attempt,
                        retries = self.retries,
                        "storage node unreachable, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
