//! Principal resolution for the issuing service
//!
//! A verified token only proves who the caller was when it was minted. Roles
//! are reloaded from the store on every request, and a token whose subject
//! no longer exists resolves to nobody.

use crate::db::UserRepository;
use actix_middleware::{Principal, PrincipalResolver};
use async_trait::async_trait;
use crypto_core::Claims;
use std::sync::Arc;
use tracing::{debug, error};

pub struct StoreBackedResolver {
    repo: Arc<dyn UserRepository>,
}

impl StoreBackedResolver {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl PrincipalResolver for StoreBackedResolver {
    async fn resolve(&self, claims: Claims) -> Option<Principal> {
        match self.repo.find_by_email(&claims.sub).await {
            Ok(Some(user)) => Some(Principal::new(user.email, user.roles)),
            Ok(None) => {
                debug!(subject = %claims.sub, "Token subject no longer exists");
                None
            }
            Err(e) => {
                error!(error = %e, "User lookup failed during authentication");
                None
            }
        }
    }
}
