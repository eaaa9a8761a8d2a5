//! Configuration for User Service
//!
//! Loaded from environment variables, with a local `.env` read first.

use anyhow::{bail, Context, Result};
use crypto_core::{validate_secret_strength, SecretStrength};
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerSettings,
    pub jwt: JwtSettings,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            bootstrap_admin: BootstrapAdmin::from_env(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8081".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }
}

/// Shared signing secret and token lifetime
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub expiration: Duration,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        check_secret(&secret)?;

        let expiration_secs: u64 = env::var("JWT_EXPIRATION_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .context("Invalid JWT_EXPIRATION_SECS")?;
        if expiration_secs == 0 {
            bail!("JWT_EXPIRATION_SECS must be at least 1");
        }

        Ok(Self {
            secret,
            expiration: Duration::from_secs(expiration_secs),
        })
    }
}

fn check_secret(secret: &str) -> Result<()> {
    match validate_secret_strength(secret.as_bytes()) {
        SecretStrength::Weak => {
            bail!("JWT_SECRET is too weak: use at least 32 random bytes")
        }
        SecretStrength::Acceptable => {
            warn!("JWT_SECRET is acceptable but shorter than the recommended 64 bytes");
            Ok(())
        }
        SecretStrength::Strong => Ok(()),
    }
}

/// Admin account seeded at startup so role-gated routes are reachable
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl BootstrapAdmin {
    fn from_env() -> Option<Self> {
        let email = env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?;
        let password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?;
        Some(Self {
            name: env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
            email,
            password,
        })
    }
}
