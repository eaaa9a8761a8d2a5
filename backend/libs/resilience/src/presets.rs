/// Preset configurations for remote dependencies
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::retry::RetryConfig;
use crate::timeout::TimeoutConfig;
use std::time::Duration;

/// Configuration bundle for one remote dependency
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub timeout: TimeoutConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: Option<RetryConfig>,
}

/// Internal HTTP calls between services (idempotent GETs)
///
/// - Timeout: 2s per attempt
/// - Circuit breaker: 50% of the last 10 calls, 10s cooldown, 1 probe
/// - Retry: 3 attempts, fixed 1s backoff
pub fn internal_http_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(2),
        },
        circuit_breaker: CircuitBreakerConfig {
            window_size: 10,
            minimum_calls: 10,
            failure_rate_threshold: 0.5,
            open_duration: Duration::from_secs(10),
            half_open_permits: 1,
        },
        retry: Some(RetryConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(1),
            backoff_multiplier: 1.0,
            jitter: false,
        }),
    }
}
