/// Bounded retry with fixed or growing backoff
///
/// Sleeps between attempts never extend past the caller's deadline: when the
/// next backoff would overrun it, the sequence stops with
/// [`RetryError::DeadlineExceeded`] instead of sleeping.
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Backoff before the second attempt
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// 1.0 keeps the backoff fixed
    pub backoff_multiplier: f64,
    /// Add random jitter to backoff (±30%)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("All {attempts} attempts failed, last error: {last}")]
    Exhausted { attempts: u32, last: E },
    #[error("Deadline exceeded after {attempts} attempts")]
    DeadlineExceeded { attempts: u32, last: Option<E> },
}

/// Execute a future with retry logic
///
/// `f` receives the 1-based attempt number.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    deadline: Option<Instant>,
    mut f: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    let mut backoff = config.initial_backoff;

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(RetryError::DeadlineExceeded {
                attempts: attempt,
                last: None,
            });
        }

        attempt += 1;
        let error = match f(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if attempt >= max_attempts {
            warn!("Max attempts ({}) reached: {}", max_attempts, error);
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: error,
            });
        }

        let delay = calculate_backoff(backoff, config.jitter);
        if deadline.is_some_and(|d| Instant::now() + delay >= d) {
            warn!(
                "Retry attempt {}/{} would overrun deadline: {}",
                attempt, max_attempts, error
            );
            return Err(RetryError::DeadlineExceeded {
                attempts: attempt,
                last: Some(error),
            });
        }

        warn!(
            "Retry attempt {}/{} failed ({}), waiting {:?}",
            attempt, max_attempts, error, delay
        );

        tokio::time::sleep(delay).await;

        backoff = Duration::from_millis(
            ((backoff.as_millis() as f64 * config.backoff_multiplier)
                .min(config.max_backoff.as_millis() as f64)) as u64,
        );
    }
}

fn calculate_backoff(base: Duration, jitter: bool) -> Duration {
    if jitter {
        let jitter_factor = 1.0 + rand::thread_rng().gen_range(-0.3..0.3); // ±30%
        Duration::from_millis((base.as_millis() as f64 * jitter_factor) as u64)
    } else {
        base
    }
}
