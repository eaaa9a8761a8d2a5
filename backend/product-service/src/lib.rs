//! Product service
//!
//! Verifies bearer tokens without a user store and enriches products with
//! their creator through a circuit-broken client to the user service.

pub mod app_state;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod services;

use actix_web::web;
use error::AppError;

pub use app_state::AppState;

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    use handlers::{health, products};

    cfg.route("/health", web::get().to(health::health)).service(
        web::scope("/products")
            .route("/health", web::get().to(health::products_health))
            .route("/available", web::get().to(products::list_available))
            .route("/user/{user_id}", web::get().to(products::list_by_user))
            .route("", web::get().to(products::list_products))
            .route("", web::post().to(products::create_product))
            .route("/{id}", web::get().to(products::get_product))
            .route("/{id}", web::put().to(products::update_product))
            .route("/{id}", web::delete().to(products::delete_product)),
    );
}
