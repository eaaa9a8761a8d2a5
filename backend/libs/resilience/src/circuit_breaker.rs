/// Circuit Breaker with a count-based sliding window
///
/// State transitions:
/// - Closed → Open: failure rate over the last `window_size` outcomes reaches
///   the threshold, once at least `minimum_calls` outcomes are recorded
/// - Open → HalfOpen: first admission attempt after `open_duration`
/// - HalfOpen → Closed: a probe succeeds (window cleared)
/// - HalfOpen → Open: a probe fails (`opened_at` reset)
///
/// Every transition bumps a generation counter. Permits remember the
/// generation they were issued in, and outcomes from an older generation are
/// dropped, so a slow call started before a trip cannot close or reopen the
/// circuit afterwards.
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, requests pass through
    Closed,
    /// Circuit is open, requests fail fast
    Open,
    /// Testing if service recovered, limited requests allowed
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of most recent outcomes considered
    pub window_size: usize,
    /// Outcomes required before the failure rate is evaluated
    pub minimum_calls: usize,
    /// Failure rate (0.0 - 1.0) at or above which the circuit opens
    pub failure_rate_threshold: f64,
    /// Cool-down before a probe is allowed
    pub open_duration: Duration,
    /// Concurrent probes admitted while HalfOpen
    pub half_open_permits: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            minimum_calls: 10,
            failure_rate_threshold: 0.5, // 50%
            open_duration: Duration::from_secs(10),
            half_open_permits: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CircuitBreakerError {
    /// Cooling down, or the probe slots are taken
    #[error("Circuit breaker is open - failing fast")]
    Open,
}

/// Point-in-time view for health reporting
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_rate: f64,
    pub calls_in_window: usize,
}

#[derive(Clone)]
pub struct CircuitBreaker {
    name: Arc<str>,
    config: CircuitBreakerConfig,
    state: Arc<Mutex<CircuitBreakerState>>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

struct CircuitBreakerState {
    current: CircuitState,
    opened_at: Option<Instant>,
    /// Sliding window: true = success, false = failure
    window: VecDeque<bool>,
    probes_in_flight: u32,
    generation: u64,
}

impl CircuitBreakerState {
    fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|&&ok| !ok).count();
        failures as f64 / self.window.len() as f64
    }

    fn transition(&mut self, to: CircuitState) {
        self.current = to;
        self.generation += 1;
        self.probes_in_flight = 0;
        match to {
            CircuitState::Open => self.opened_at = Some(Instant::now()),
            CircuitState::HalfOpen => {}
            CircuitState::Closed => {
                self.opened_at = None;
                self.window.clear();
            }
        }
    }
}

/// Admission ticket for one logical call
///
/// Report the outcome with [`CallPermit::success`] or
/// [`CallPermit::failure`]. A permit dropped without an outcome (the caller
/// was cancelled) records nothing and hands its probe slot back.
#[must_use = "a permit must be settled with success() or failure()"]
pub struct CallPermit {
    breaker: CircuitBreaker,
    generation: u64,
    probe: bool,
    settled: bool,
}

impl CallPermit {
    pub fn success(mut self) {
        self.settled = true;
        self.breaker.record(self.generation, true);
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record(self.generation, false);
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.release_probe(self.generation);
        }
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<Arc<str>>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(CircuitBreakerState {
                current: CircuitState::Closed,
                opened_at: None,
                window: VecDeque::with_capacity(config.window_size),
                probes_in_flight: 0,
                generation: 0,
            })),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Ask to make one call against the dependency
    pub fn try_acquire(&self) -> Result<CallPermit, CircuitBreakerError> {
        let mut state = self.state.lock();

        if state.current == CircuitState::Open {
            let cooled_down = state
                .opened_at
                .map_or(true, |at| at.elapsed() >= self.config.open_duration);
            if !cooled_down {
                return Err(CircuitBreakerError::Open);
            }
            info!(breaker = %self.name, "Circuit breaker: Open → HalfOpen");
            state.transition(CircuitState::HalfOpen);
        }

        let probe = state.current == CircuitState::HalfOpen;
        if probe {
            if state.probes_in_flight >= self.config.half_open_permits {
                debug!(breaker = %self.name, "Probe already in flight, rejecting");
                return Err(CircuitBreakerError::Open);
            }
            state.probes_in_flight += 1;
        }

        Ok(CallPermit {
            breaker: self.clone(),
            generation: state.generation,
            probe,
            settled: false,
        })
    }

    fn record(&self, generation: u64, success: bool) {
        let mut state = self.state.lock();

        if state.generation != generation {
            debug!(breaker = %self.name, "Ignoring outcome from a previous circuit generation");
            return;
        }

        match state.current {
            CircuitState::Closed => {
                if state.window.len() >= self.config.window_size {
                    state.window.pop_front();
                }
                state.window.push_back(success);

                let failure_rate = state.failure_rate();
                if state.window.len() >= self.config.minimum_calls
                    && failure_rate >= self.config.failure_rate_threshold
                {
                    let failures = state.window.iter().filter(|&&ok| !ok).count();
                    warn!(
                        breaker = %self.name,
                        failures,
                        window = state.window.len(),
                        "Circuit breaker: Closed → Open (failure_rate: {:.2}%)",
                        failure_rate * 100.0
                    );
                    state.transition(CircuitState::Open);
                }
            }
            CircuitState::HalfOpen if success => {
                info!(breaker = %self.name, "Circuit breaker: HalfOpen → Closed");
                state.transition(CircuitState::Closed);
            }
            CircuitState::HalfOpen => {
                warn!(breaker = %self.name, "Circuit breaker: HalfOpen → Open (probe failed)");
                state.transition(CircuitState::Open);
            }
            CircuitState::Open => {
                // Already open, nothing to do
            }
        }
    }

    fn release_probe(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation == generation && state.current == CircuitState::HalfOpen {
            state.probes_in_flight = state.probes_in_flight.saturating_sub(1);
        }
    }

    /// Get current circuit state (for monitoring)
    pub fn state(&self) -> CircuitState {
        self.state.lock().current
    }

    /// Failure rate over the current window (for monitoring)
    pub fn failure_rate(&self) -> f64 {
        self.state.lock().failure_rate()
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let state = self.state.lock();
        CircuitSnapshot {
            name: self.name.to_string(),
            state: state.current,
            failure_rate: state.failure_rate(),
            calls_in_window: state.window.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            open_duration: Duration::from_millis(100),
            ..Default::default()
        }
    }

    fn fail(cb: &CircuitBreaker) {
        if let Ok(permit) = cb.try_acquire() {
            permit.failure();
        }
    }

    fn succeed(cb: &CircuitBreaker) {
        if let Ok(permit) = cb.try_acquire() {
            permit.success();
        }
    }

    #[tokio::test]
    async fn test_half_failed_window_opens_circuit() {
        let cb = CircuitBreaker::new("test", CircuitBreakerConfig::default());

        for _ in 0..5 {
            succeed(&cb);
        }
        for _ in 0..4 {
            fail(&cb);
        }
        assert_eq!(cb.state(), CircuitState::Closed);

        // 5 of the last 10
        fail(&cb);
        assert_eq!(cb.state(), CircuitState::Open);

        assert_eq!(cb.try_acquire().err(), Some(CircuitBreakerError::Open));
    }

    #[tokio::test]
    async fn test_minimum_calls_required_before_opening() {
        let cb = CircuitBreaker::new("test", CircuitBreakerConfig::default());

        for _ in 0..9 {
            fail(&cb);
        }
        assert_eq!(cb.state(), CircuitState::Closed);

        fail(&cb);
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let cb = CircuitBreaker::new("test", CircuitBreakerConfig::default());

        for _ in 0..4 {
            fail(&cb);
        }
        for _ in 0..10 {
            succeed(&cb);
        }
        assert_eq!(cb.snapshot().calls_in_window, 10);
        assert_eq!(cb.failure_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_open_to_halfopen_after_cooldown() {
        let cb = CircuitBreaker::new("test", fast_config());
        for _ in 0..10 {
            fail(&cb);
        }
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.try_acquire().is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;

        let permit = cb.try_acquire().expect("probe admitted");
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        drop(permit);
    }

    #[tokio::test]
    async fn test_single_probe_admitted() {
        let cb = CircuitBreaker::new("test", fast_config());
        for _ in 0..10 {
            fail(&cb);
        }
        tokio::time::sleep(Duration::from_millis(150)).await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cb = cb.clone();
                std::thread::spawn(move || cb.try_acquire().ok())
            })
            .collect();
        let permits: Vec<CallPermit> = handles
            .into_iter()
            .filter_map(|h| h.join().ok().flatten())
            .collect();

        assert_eq!(permits.len(), 1);
    }

    #[tokio::test]
    async fn test_probe_success_closes_with_empty_window() {
        let cb = CircuitBreaker::new("test", fast_config());
        for _ in 0..10 {
            fail(&cb);
        }
        tokio::time::sleep(Duration::from_millis(150)).await;

        succeed(&cb);

        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.snapshot().calls_in_window, 0);
        assert_eq!(cb.failure_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_probe_failure_reopens() {
        let cb = CircuitBreaker::new("test", fast_config());
        for _ in 0..10 {
            fail(&cb);
        }
        tokio::time::sleep(Duration::from_millis(150)).await;

        fail(&cb);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.try_acquire().is_err());
    }

    #[tokio::test]
    async fn test_dropped_probe_returns_slot() {
        let cb = CircuitBreaker::new("test", fast_config());
        for _ in 0..10 {
            fail(&cb);
        }
        tokio::time::sleep(Duration::from_millis(150)).await;

        let first = cb.try_acquire().expect("probe admitted");
        assert!(cb.try_acquire().is_err());
        drop(first);

        let second = cb.try_acquire().expect("slot returned");
        second.success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_stale_outcome_ignored_after_trip() {
        let cb = CircuitBreaker::new("test", fast_config());
        let slow = cb.try_acquire().expect("closed admits");

        for _ in 0..10 {
            fail(&cb);
        }
        assert_eq!(cb.state(), CircuitState::Open);

        // Started before the trip, finishes after it
        slow.success();
        assert_eq!(cb.state(), CircuitState::Open);
    }
}
