use actix_middleware::CorrelationIdMiddleware;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use crypto_core::TokenCodec;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use user_service::config::{BootstrapAdmin, Config};
use user_service::db::{InMemoryUserRepository, UserRepository};
use user_service::error::AuthError;
use user_service::logging::init_tracing;
use user_service::models::NewUser;
use user_service::security::hash_password;
use user_service::{configure, json_config, AppState};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(?config, "Starting user-service");

    let codec = Arc::new(
        TokenCodec::new(config.jwt.secret.as_bytes()).context("Failed to build token codec")?,
    );
    let repo: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
    if let Some(admin) = &config.bootstrap_admin {
        seed_admin(repo.as_ref(), admin).await?;
    }

    let state = AppState::new(repo, codec, config.jwt.expiration);
    let bind_addr = (config.server.host.clone(), config.server.port);
    info!("Listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config())
            .wrap(state.auth_middleware())
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

async fn seed_admin(repo: &dyn UserRepository, admin: &BootstrapAdmin) -> Result<()> {
    let new = NewUser {
        name: admin.name.clone(),
        email: admin.email.clone(),
        password_hash: hash_password(&admin.password)?,
        phone: None,
        address: None,
        roles: vec!["ROLE_ADMIN".to_string(), "ROLE_USER".to_string()],
    };
    match repo.insert(new).await {
        Ok(user) => info!(user_id = user.id, "Seeded bootstrap admin"),
        Err(AuthError::EmailAlreadyExists) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
