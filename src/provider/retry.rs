use std::time::Duration;

use crate::{config, journal::Journal};

use super::Error;

/// Exponential backoff applied to provider-declared rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl From<config::Retry> for RetryPolicy {
    fn from(retry: config::Retry) -> Self {
        Self {
            max_retries: retry.max_retries,
            initial_delay: Duration::from_millis(retry.initial_retry_delay),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `attempt + 1`: `initial_delay * 2^attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.checked_pow(attempt).unwrap_or(u32::MAX))
    }

    /// Drive `op` until it stops reporting [`Error::RateLimited`] or the
    /// retry budget runs out. A daily limit is never retried.
    pub async fn run<T, F, Fut, J>(&self, journal: &J, mut op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
        J: Journal,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(Error::RateLimited { message }) => {
                    journal
                        .warn(&format!("Rate limit hit. Provider message: {message}"))
                        .await;
                    if attempt >= self.max_retries {
                        journal.warn("Max retries reached for rate limit").await;
                        return Err(Error::RateLimitExhausted {
                            attempts: attempt + 1,
                        });
                    }
                    let delay = self.delay(attempt);
                    journal
                        .info(&format!(
                            "Retrying after {} seconds...",
                            delay.as_secs_f64()
                        ))
                        .await;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(Error::DailyLimitReached { message }) => {
                    journal
                        .error(&format!(
                            "Daily rate limit reached ({message}). The run will now end."
                        ))
                        .await;
                    return Err(Error::DailyLimitReached { message });
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tokio::time::Instant;

    use super::*;
    use crate::journal::MemoryJournal;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(100),
        }
    }

    fn rate_limited() -> Error {
        Error::RateLimited {
            message: "slow down".into(),
        }
    }

    fn assert_elapsed(started: Instant, millis: u64) {
        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_millis(millis)
                && elapsed < Duration::from_millis(millis + 10),
            "{elapsed:?}"
        );
    }

    #[test]
    fn delays_double() {
        let policy = policy(5);
        let delays = (0..4).map(|n| policy.delay(n)).collect::<Vec<_>>();
        assert_eq!(
            delays,
            [100, 200, 400, 800].map(Duration::from_millis).to_vec()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_with_exponential_waits() {
        let journal = MemoryJournal::default();
        let calls = Cell::new(0);
        let started = Instant::now();
        let result = policy(5)
            .run(&journal, || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n <= 3 { Err(rate_limited()) } else { Ok(n) } }
            })
            .await
            .unwrap();
        assert_eq!(result, 4);
        // 100 + 200 + 400
        assert_elapsed(started, 700);
        assert!(journal.contains("Retrying after 0.4 seconds..."));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_retries_plus_one_signals() {
        let journal = MemoryJournal::default();
        let calls = Cell::new(0u32);
        let started = Instant::now();
        let err = policy(3)
            .run(&journal, || {
                calls.set(calls.get() + 1);
                async { Err::<(), _>(rate_limited()) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimitExhausted { attempts: 4 }));
        assert_eq!(calls.get(), 4);
        assert_elapsed(started, 700);
        assert!(journal.contains("Max retries reached for rate limit"));
    }

    #[tokio::test(start_paused = true)]
    async fn daily_limit_is_not_retried() {
        let journal = MemoryJournal::default();
        let calls = Cell::new(0u32);
        let started = Instant::now();
        let err = policy(5)
            .run(&journal, || {
                calls.set(calls.get() + 1);
                async {
                    Err::<(), _>(Error::DailyLimitReached {
                        message: "daily rate limit".into(),
                    })
                }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DailyLimitReached { .. }));
        assert_eq!(calls.get(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn other_errors_propagate_immediately() {
        let journal = MemoryJournal::default();
        let calls = Cell::new(0u32);
        let err = policy(5)
            .run(&journal, || {
                calls.set(calls.get() + 1);
                async { Err::<(), _>(Error::Decode("garbage".into())) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(calls.get(), 1);
        assert!(journal.lines().is_empty());
    }
}
