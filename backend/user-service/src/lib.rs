//! User service
//!
//! Issues bearer tokens and owns the user store. Every authenticated request
//! reloads the caller's roles from the store, so revoked roles take effect
//! before the token expires.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod security;
pub mod services;

use actix_web::web;
use error::AuthError;

pub use app_state::AppState;

/// Malformed JSON bodies answer with the service error shape
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AuthError::Validation(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::users::health))
        .service(
            web::scope("/auth")
                .route("/login", web::post().to(handlers::auth::login))
                .route("/register", web::post().to(handlers::auth::register)),
        )
        .service(
            web::scope("/users")
                // Literal paths first so they never match `{id}`
                .route("/health", web::get().to(handlers::users::health))
                .route("/me", web::get().to(handlers::users::me))
                .route("", web::get().to(handlers::users::list_users))
                .route("", web::post().to(handlers::users::create_user))
                .route("/{id}", web::get().to(handlers::users::get_user))
                .route("/{id}", web::put().to(handlers::users::update_user))
                .route("/{id}", web::delete().to(handlers::users::delete_user)),
        );
}
