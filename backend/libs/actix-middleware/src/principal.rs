//! Authenticated principal and how it is built from verified claims
//!
//! Services choose a [`PrincipalResolver`]:
//! - the issuing service reloads the user record so role changes apply to
//!   tokens that are already out
//! - verifying services use [`ClaimsResolver`] and trust the roles carried
//!   in the token

use async_trait::async_trait;
use crypto_core::Claims;
use serde::Serialize;

pub const ADMIN_ROLE: &str = "ADMIN";

const ROLE_PREFIX: &str = "ROLE_";

/// Identity installed into request scope for a valid token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    /// Token subject (user email)
    pub identity: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(identity: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            identity: identity.into(),
            roles,
        }
    }

    pub fn from_claims(claims: &Claims) -> Self {
        Self::new(claims.sub.clone(), claims.roles.clone())
    }

    /// Role check that treats `ADMIN` and `ROLE_ADMIN` as the same role
    pub fn has_role(&self, role: &str) -> bool {
        let wanted = bare_role(role);
        self.roles
            .iter()
            .any(|held| bare_role(held).eq_ignore_ascii_case(wanted))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

fn bare_role(role: &str) -> &str {
    role.strip_prefix(ROLE_PREFIX).unwrap_or(role)
}

/// Turns verified claims into a principal
///
/// `None` means the token verified but no longer maps to anyone; the request
/// then continues unauthenticated.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn resolve(&self, claims: Claims) -> Option<Principal>;
}

/// Builds the principal straight from the token, no lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsResolver;

#[async_trait]
impl PrincipalResolver for ClaimsResolver {
    async fn resolve(&self, claims: Claims) -> Option<Principal> {
        Some(Principal::from_claims(&claims))
    }
}
