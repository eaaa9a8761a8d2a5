//! Application state shared by every worker

use crate::db::UserRepository;
use crate::security::StoreBackedResolver;
use crate::services::{AuthService, UserService};
use actix_middleware::JwtAuthMiddleware;
use crypto_core::{TokenCodec, TokenValidator};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    repo: Arc<dyn UserRepository>,
    codec: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(repo: Arc<dyn UserRepository>, codec: Arc<TokenCodec>, token_ttl: Duration) -> Self {
        Self {
            auth: Arc::new(AuthService::new(repo.clone(), codec.clone(), token_ttl)),
            users: Arc::new(UserService::new(repo.clone())),
            repo,
            codec,
        }
    }

    /// Authentication layer that reloads roles from the store
    pub fn auth_middleware(&self) -> JwtAuthMiddleware {
        JwtAuthMiddleware::new(
            TokenValidator::new(self.codec.clone()),
            Arc::new(StoreBackedResolver::new(self.repo.clone())),
        )
    }

    pub fn repo(&self) -> &Arc<dyn UserRepository> {
        &self.repo
    }
}
