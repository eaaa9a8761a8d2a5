//! Bearer token authentication middleware
//!
//! Never rejects a request. A missing or invalid token leaves the request
//! unauthenticated and route guards decide; a valid token installs the
//! resolved [`Principal`] and the raw [`BearerToken`] into request
//! extensions.

use crate::principal::{Principal, PrincipalResolver};
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use crypto_core::TokenValidator;
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

use crate::guards::AuthRejection;

/// Raw token of an authenticated request, for forwarding to peers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for BearerToken {
    type Error = AuthRejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<BearerToken>()
                .cloned()
                .ok_or(AuthRejection::Unauthenticated),
        )
    }
}

/// Token from `Authorization: Bearer <token>`, if any
///
/// The scheme name matches case-insensitively.
pub fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// JWT Authentication Middleware
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    validator: TokenValidator,
    resolver: Arc<dyn PrincipalResolver>,
}

impl JwtAuthMiddleware {
    pub fn new(validator: TokenValidator, resolver: Arc<dyn PrincipalResolver>) -> Self {
        Self {
            validator,
            resolver,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            validator: self.validator.clone(),
            resolver: self.resolver.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    validator: TokenValidator,
    resolver: Arc<dyn PrincipalResolver>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let validator = self.validator.clone();
        let resolver = self.resolver.clone();

        Box::pin(async move {
            let claims = bearer_from_headers(req.headers())
                .and_then(|token| validator.claims(&token).map(|claims| (token, claims)));

            if let Some((token, claims)) = claims {
                let subject = claims.sub.clone();
                match resolver.resolve(claims).await {
                    Some(principal) => {
                        let mut extensions = req.extensions_mut();
                        extensions.insert::<Principal>(principal);
                        extensions.insert(BearerToken(token));
                    }
                    None => debug!(subject = %subject, "Token subject no longer resolves"),
                }
            }

            service.call(req).await
        })
    }
}
