//! # Actix Middleware Library
//!
//! Middleware shared by the Actix services
//!
//! ## Modules
//! - `jwt_auth`: bearer token authentication (never rejects, installs the principal)
//! - `principal`: the authenticated principal and how it is resolved from claims
//! - `guards`: per-route extractors for authenticated and admin-only routes
//! - `correlation_id`: X-Correlation-ID propagation
//! - `deadline`: per-request deadline for outbound calls

pub mod correlation_id;
pub mod deadline;
pub mod guards;
pub mod jwt_auth;
pub mod principal;

pub use correlation_id::{CorrelationId, CorrelationIdMiddleware, CORRELATION_ID_HEADER};
pub use deadline::{DeadlineMiddleware, RequestDeadline};
pub use guards::{require_role, AdminOnly, AuthRejection, Authenticated};
pub use jwt_auth::{bearer_from_headers, BearerToken, JwtAuthMiddleware};
pub use principal::{ClaimsResolver, Principal, PrincipalResolver, ADMIN_ROLE};
