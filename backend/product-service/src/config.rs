//! Configuration for Product Service
//!
//! Loaded from environment variables, with a local `.env` read first.

use anyhow::{bail, Context, Result};
use crypto_core::{validate_secret_strength, SecretStrength};
use resilience::{CircuitBreakerConfig, RetryConfig, ServiceConfig, TimeoutConfig};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerSettings,
    pub jwt_secret: JwtSecret,
    pub user_service: UserServiceSettings,
    /// Budget for a whole inbound request, outbound calls included
    pub request_deadline: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        check_secret(&secret)?;

        Ok(Self {
            server: ServerSettings {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 8082)?,
            },
            jwt_secret: JwtSecret(secret),
            user_service: UserServiceSettings::from_env()?,
            request_deadline: Duration::from_millis(parse_var("REQUEST_DEADLINE_MS", 8000)?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct JwtSecret(pub String);

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret(<redacted>)")
    }
}

/// Peer address and the resilience policy wrapped around calls to it
#[derive(Debug, Clone)]
pub struct UserServiceSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub cb_window: usize,
    pub cb_failure_rate: f64,
    pub cb_open: Duration,
    pub cb_half_open_permits: u32,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for UserServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            timeout: Duration::from_millis(2000),
            cb_window: 10,
            cb_failure_rate: 0.5,
            cb_open: Duration::from_secs(10),
            cb_half_open_permits: 1,
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(1000),
        }
    }
}

impl UserServiceSettings {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let settings = Self {
            base_url: env::var("USER_SERVICE_URL").unwrap_or(defaults.base_url),
            timeout: Duration::from_millis(parse_var("USER_SERVICE_TIMEOUT_MS", 2000)?),
            cb_window: parse_var("USER_SERVICE_CB_WINDOW", defaults.cb_window)?,
            cb_failure_rate: parse_var("USER_SERVICE_CB_FAILURE_RATE", defaults.cb_failure_rate)?,
            cb_open: Duration::from_secs(parse_var("USER_SERVICE_CB_OPEN_SECS", 10)?),
            cb_half_open_permits: parse_var(
                "USER_SERVICE_CB_HALF_OPEN_PERMITS",
                defaults.cb_half_open_permits,
            )?,
            retry_attempts: parse_var("USER_SERVICE_RETRY_ATTEMPTS", defaults.retry_attempts)?,
            retry_backoff: Duration::from_millis(parse_var("USER_SERVICE_RETRY_BACKOFF_MS", 1000)?),
        };
        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<()> {
        if self.cb_window == 0 {
            bail!("USER_SERVICE_CB_WINDOW must be at least 1");
        }
        if !(self.cb_failure_rate > 0.0 && self.cb_failure_rate <= 1.0) {
            bail!("USER_SERVICE_CB_FAILURE_RATE must be in (0, 1]");
        }
        if self.cb_half_open_permits == 0 {
            bail!("USER_SERVICE_CB_HALF_OPEN_PERMITS must be at least 1");
        }
        if self.retry_attempts == 0 {
            bail!("USER_SERVICE_RETRY_ATTEMPTS must be at least 1");
        }
        Ok(())
    }

    /// Policy for the remote client; the window doubles as the minimum sample
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            timeout: TimeoutConfig {
                duration: self.timeout,
            },
            circuit_breaker: CircuitBreakerConfig {
                window_size: self.cb_window,
                minimum_calls: self.cb_window,
                failure_rate_threshold: self.cb_failure_rate,
                open_duration: self.cb_open,
                half_open_permits: self.cb_half_open_permits,
            },
            retry: Some(RetryConfig {
                max_attempts: self.retry_attempts,
                initial_backoff: self.retry_backoff,
                max_backoff: self.retry_backoff,
                backoff_multiplier: 1.0,
                jitter: false,
            }),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("Invalid {name}")),
        Err(_) => Ok(default),
    }
}

fn check_secret(secret: &str) -> Result<()> {
    match validate_secret_strength(secret.as_bytes()) {
        SecretStrength::Weak => bail!("JWT_SECRET is too weak: use at least 32 random bytes"),
        SecretStrength::Acceptable => {
            warn!("JWT_SECRET is acceptable but shorter than the recommended 64 bytes");
            Ok(())
        }
        SecretStrength::Strong => Ok(()),
    }
}
