use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry an async operation up to `max_attempts` times, sleeping between
/// attempts according to `delay(attempt)`. The last error is returned once
/// attempts are exhausted.
pub async fn retry_with_backoff<T, E, F, Fut, D>(
    max_attempts: u32,
    delay: D,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: Fn(u32) -> Duration,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => return Err(err),
            Err(err) => {
                let wait = delay(attempt);
                log::warn!("attempt {attempt}/{max_attempts} failed: {err}; retrying in {wait:?}");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

/// Delay function growing linearly with the attempt number: `attempt * step`.
pub fn linear_backoff(step: Duration) -> impl Fn(u32) -> Duration {
    move |attempt| step * attempt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn no_delay(_attempt: u32) -> Duration {
        Duration::ZERO
    }

    #[tokio::test]
    async fn test_first_attempt_success_does_not_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(3, no_delay, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(3, no_delay, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 1 {
                    Err("transient".to_string())
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausts_attempts_and_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(3, no_delay, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err(format!("failure {n}")) }
        })
        .await;
        assert_eq!(result.unwrap_err(), "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_linear_backoff_grows_with_attempt() {
        let delay = linear_backoff(Duration::from_millis(1000));
        assert_eq!(delay(1), Duration::from_millis(1000));
        assert_eq!(delay(2), Duration::from_millis(2000));
        assert_eq!(delay(3), Duration::from_millis(3000));
    }
}
