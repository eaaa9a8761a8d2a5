use actix_middleware::CorrelationIdMiddleware;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use crypto_core::TokenCodec;
use product_service::clients::UserClient;
use product_service::config::Config;
use product_service::db::InMemoryProductRepository;
use product_service::logging::init_tracing;
use product_service::{configure, json_config, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(?config, "Starting product-service");

    let codec = Arc::new(
        TokenCodec::new(config.jwt_secret.0.as_bytes()).context("Failed to build token codec")?,
    );
    // One client, and so one breaker, shared by every worker
    let users = Arc::new(UserClient::new(
        &config.user_service.base_url,
        config.user_service.service_config(),
    ));
    let state = AppState::new(
        Arc::new(InMemoryProductRepository::new()),
        users,
        codec,
        config.request_deadline,
    );

    let bind_addr = (config.server.host.clone(), config.server.port);
    info!("Listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config())
            .wrap(state.auth_middleware())
            .wrap(state.deadline_middleware())
            .wrap(CorrelationIdMiddleware)
            .wrap(TracingLogger::default())
            .configure(configure)
    })
    .bind(bind_addr)
    .context("Failed to bind server address")?
    .run()
    .await
    .context("Server terminated with an error")
}
