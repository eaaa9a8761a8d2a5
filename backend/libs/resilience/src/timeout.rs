/// Per-attempt time bound, cut short by the caller's deadline
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout, Instant};

#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Upper bound for a single attempt
    pub duration: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    #[error("timed out after {0:?}")]
    Elapsed(Duration),
    /// The attempt was never started
    #[error("no time left before deadline")]
    DeadlinePassed,
}

/// Time one attempt may take: the configured bound, cut short by the deadline
///
/// `None` once the deadline has passed.
pub fn attempt_budget(per_attempt: Duration, deadline: Option<Instant>) -> Option<Duration> {
    match deadline {
        None => Some(per_attempt),
        Some(deadline) => {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            if remaining.is_zero() {
                None
            } else {
                Some(per_attempt.min(remaining))
            }
        }
    }
}

/// Run one attempt within its budget
///
/// When the deadline has already passed the future is dropped unpolled, so
/// nothing it would have sent leaves the process.
pub async fn with_timeout<F, T>(
    per_attempt: Duration,
    deadline: Option<Instant>,
    future: F,
) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    let budget = attempt_budget(per_attempt, deadline).ok_or(TimeoutError::DeadlinePassed)?;
    timeout(budget, future)
        .await
        .map_err(|_| TimeoutError::Elapsed(budget))
}
