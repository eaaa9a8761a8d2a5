/// Breaker + retry + timeout composed around one remote dependency
///
/// One `Resilient` is built per dependency at startup and shared by
/// reference. A logical call takes one breaker permit, runs up to
/// `max_attempts` time-bounded attempts, and records exactly one outcome.
use crate::circuit_breaker::{CircuitBreaker, CircuitSnapshot};
use crate::presets::ServiceConfig;
use crate::retry::{with_retry, RetryConfig, RetryError};
use crate::timeout::{with_timeout, TimeoutError};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ResilienceError<E> {
    #[error("circuit open, call not attempted")]
    CircuitOpen,
    #[error("deadline exceeded after {attempts} attempts")]
    DeadlineExceeded { attempts: u32 },
    #[error("timed out after {attempts} attempts ({after:?} each)")]
    Timeout { attempts: u32, after: Duration },
    #[error("failed after {attempts} attempts: {last}")]
    Failed { attempts: u32, last: E },
}

#[derive(Debug)]
enum AttemptError<E> {
    Failed(E),
    Bounded(TimeoutError),
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Failed(e) => write!(f, "{e}"),
            AttemptError::Bounded(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resilient {
    breaker: CircuitBreaker,
    retry: RetryConfig,
    attempt_timeout: Duration,
}

impl Resilient {
    pub fn new(name: &str, config: ServiceConfig) -> Self {
        let retry = config.retry.unwrap_or(RetryConfig {
            max_attempts: 1,
            ..Default::default()
        });
        Self {
            breaker: CircuitBreaker::new(name, config.circuit_breaker),
            retry,
            attempt_timeout: config.timeout.duration,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        self.breaker.snapshot()
    }

    /// Run `f` under the policy
    ///
    /// `f` receives the 1-based attempt number. `Ok` of any value counts as a
    /// breaker success, so callers map "absent but answered" to `Ok(None)`.
    pub async fn invoke<F, Fut, T, E>(
        &self,
        deadline: Option<Instant>,
        mut f: F,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let permit = self
            .breaker
            .try_acquire()
            .map_err(|_| ResilienceError::CircuitOpen)?;

        let per_attempt = self.attempt_timeout;
        let outcome = with_retry(&self.retry, deadline, |attempt| {
            let call = f(attempt);
            async move {
                match with_timeout(per_attempt, deadline, call).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => Err(AttemptError::Failed(e)),
                    Err(e) => Err(AttemptError::Bounded(e)),
                }
            }
        })
        .await;

        match outcome {
            Ok(value) => {
                permit.success();
                Ok(value)
            }
            Err(RetryError::Exhausted {
                attempts,
                last: AttemptError::Failed(last),
            }) => {
                permit.failure();
                Err(ResilienceError::Failed { attempts, last })
            }
            Err(RetryError::Exhausted {
                attempts,
                last: AttemptError::Bounded(TimeoutError::Elapsed(after)),
            }) => {
                permit.failure();
                Err(ResilienceError::Timeout { attempts, after })
            }
            Err(RetryError::DeadlineExceeded {
                attempts,
                last: Some(AttemptError::Failed(_) | AttemptError::Bounded(TimeoutError::Elapsed(_))),
            }) => {
                permit.failure();
                Err(ResilienceError::DeadlineExceeded { attempts })
            }
            // The last attempt never started; dropping the permit records no outcome
            Err(RetryError::Exhausted {
                attempts,
                last: AttemptError::Bounded(TimeoutError::DeadlinePassed),
            })
            | Err(RetryError::DeadlineExceeded {
                attempts,
                last: Some(AttemptError::Bounded(TimeoutError::DeadlinePassed)) | None,
            }) => {
                debug!(breaker = %self.breaker.name(), attempts, "Deadline passed before the attempt went out");
                drop(permit);
                Err(ResilienceError::DeadlineExceeded { attempts })
            }
        }
    }
}
