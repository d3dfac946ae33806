use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Bounded exponential backoff with optional random jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
            jitter: Some(Duration::from_millis(200)),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            jitter: None,
        }
    }

    fn jittered(&self, backoff: Duration) -> Duration {
        let Some(jitter) = self.jitter else {
            return backoff;
        };
        let max_ms = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return backoff;
        }
        backoff.saturating_add(Duration::from_millis(rand::rng().random_range(0..=max_ms)))
    }

    /// Doubles `current`, capped at `max_backoff`.
    fn next_backoff(&self, current: Duration) -> Duration {
        current
            .checked_mul(2)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Runs `f` until it succeeds, fails with an error `is_retryable` rejects, or
/// `policy.max_attempts` is used up.
///
/// # Errors
///
/// Returns the error of the last attempt.
pub async fn retry_async<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let attempts = policy.max_attempts.max(1);
    let mut backoff = policy.base_backoff;
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= attempts || !is_retryable(&err) => return Err(err),
            Err(err) => {
                let wait = policy.jittered(backoff);
                warn!(attempt, max_attempts = attempts, error = %err, ?wait, "attempt failed, retrying");
                tokio::time::sleep(wait).await;
                backoff = policy.next_backoff(backoff);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            jitter: Some(Duration::from_millis(2)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry_async(&quick(3), |_| true, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Err("unavailable") } else { Ok(n) }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry_async(&quick(2), |_| true, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down")
        })
        .await;
        assert_eq!(result, Err("down"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let _: Result<(), &str> = retry_async(&quick(0), |_| true, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down")
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_stop_after_one_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry_async(&quick(5), |e| *e != "conflict", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("conflict")
        })
        .await;
        assert_eq!(result, Err("conflict"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let policy = quick(3);
        assert_eq!(policy.next_backoff(Duration::from_millis(1)), Duration::from_millis(2));
        assert_eq!(policy.next_backoff(Duration::from_millis(3)), Duration::from_millis(4));
    }

    #[test]
    fn huge_backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_backoff: Duration::MAX,
            max_backoff: Duration::from_secs(30),
            jitter: Some(Duration::from_millis(5)),
        };
        assert_eq!(policy.next_backoff(Duration::MAX), Duration::from_secs(30));
        assert_eq!(policy.jittered(Duration::MAX), Duration::MAX);
    }

    #[test]
    fn jitter_stays_within_bound() {
        let policy = quick(1);
        for _ in 0..50 {
            let wait = policy.jittered(Duration::from_millis(10));
            assert!(wait >= Duration::from_millis(10));
            assert!(wait <= Duration::from_millis(12));
        }
    }
}
