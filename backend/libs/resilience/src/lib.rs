/// Resilience patterns for calls to remote dependencies
///
/// - **Circuit Breaker**: fails fast once a dependency's recent failure rate crosses a threshold
/// - **Retry**: bounded attempts with fixed backoff that respects the caller's deadline
/// - **Timeout**: per-attempt bound, shortened by the caller's deadline
/// - **Policy**: explicit composition of the three behind one `invoke`
///
/// # Example: peer HTTP call
///
/// ```rust,no_run
/// use resilience::{presets, Resilient, ResilienceError};
///
/// #[tokio::main]
/// async fn main() {
///     let policy = Resilient::new("user-service", presets::internal_http_config());
///
///     let result = policy
///         .invoke(None, |_attempt| async {
///             // Your HTTP call here
///             Ok::<_, String>(Some("user"))
///         })
///         .await;
///
///     match result {
///         Ok(user) => println!("{user:?}"),
///         Err(ResilienceError::CircuitOpen) => println!("serve fallback"),
///         Err(e) => println!("serve fallback: {e}"),
///     }
/// }
/// ```

pub mod circuit_breaker;
pub mod policy;
pub mod presets;
pub mod retry;
pub mod timeout;

// Re-export main types for convenience
pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitSnapshot,
    CircuitState,
};
pub use policy::{ResilienceError, Resilient};
pub use presets::{internal_http_config, ServiceConfig};
pub use retry::{with_retry, RetryConfig, RetryError};
pub use timeout::{attempt_budget, with_timeout, TimeoutConfig, TimeoutError};
