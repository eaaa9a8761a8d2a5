//! Per-route authorization
//!
//! Public routes take no guard. Protected routes take [`Authenticated`],
//! role-gated routes take [`AdminOnly`] or call [`require_role`].

use crate::principal::{Principal, ADMIN_ROLE};
use actix_web::{
    dev::Payload, http::StatusCode, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    ResponseError,
};
use futures::future::{ready, Ready};
use serde_json::json;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// 401: route needs a principal and there is none
    Unauthenticated,
    /// 403: principal lacks the role
    AccessDenied,
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthRejection::Unauthenticated => f.write_str("Authentication required"),
            AuthRejection::AccessDenied => f.write_str("Insufficient permissions"),
        }
    }
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthRejection::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthRejection::AccessDenied => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AuthRejection::Unauthenticated => "Unauthenticated",
            AuthRejection::AccessDenied => "Access denied",
        };
        let status = self.status_code();
        HttpResponse::build(status).json(json!({
            "error": error,
            "status": status.as_u16(),
            "message": self.to_string(),
        }))
    }
}

pub fn require_role(principal: &Principal, role: &str) -> Result<(), AuthRejection> {
    if principal.has_role(role) {
        Ok(())
    } else {
        Err(AuthRejection::AccessDenied)
    }
}

fn principal_of(req: &HttpRequest) -> Result<Principal, AuthRejection> {
    req.extensions()
        .get::<Principal>()
        .cloned()
        .ok_or(AuthRejection::Unauthenticated)
}

/// Any authenticated principal
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl FromRequest for Authenticated {
    type Error = AuthRejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(principal_of(req).map(Authenticated))
    }
}

/// Authenticated principal holding the admin role
#[derive(Debug, Clone)]
pub struct AdminOnly(pub Principal);

impl FromRequest for AdminOnly {
    type Error = AuthRejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(principal_of(req).and_then(|principal| {
            require_role(&principal, ADMIN_ROLE)?;
            Ok(AdminOnly(principal))
        }))
    }
}
