//! Application state shared by every worker

use crate::clients::UserClient;
use crate::db::ProductRepository;
use crate::services::ProductService;
use actix_middleware::{ClaimsResolver, DeadlineMiddleware, JwtAuthMiddleware};
use crypto_core::{TokenCodec, TokenValidator};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductService>,
    codec: Arc<TokenCodec>,
    request_deadline: Duration,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn ProductRepository>,
        users: Arc<UserClient>,
        codec: Arc<TokenCodec>,
        request_deadline: Duration,
    ) -> Self {
        Self {
            products: Arc::new(ProductService::new(repo, users)),
            codec,
            request_deadline,
        }
    }

    /// Authentication layer that trusts the roles carried in the token
    pub fn auth_middleware(&self) -> JwtAuthMiddleware {
        JwtAuthMiddleware::new(
            TokenValidator::new(self.codec.clone()),
            Arc::new(ClaimsResolver),
        )
    }

    pub fn deadline_middleware(&self) -> DeadlineMiddleware {
        DeadlineMiddleware::new(self.request_deadline)
    }
}
