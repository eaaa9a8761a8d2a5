use crate::app_state::AppState;
use crate::error::Result;
use crate::models::{CreateUserRequest, UpdateUserRequest};
use actix_middleware::{AdminOnly, Authenticated};
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "user-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /users/me
pub async fn me(
    state: web::Data<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<HttpResponse> {
    let user = state.users.get_by_email(&principal.identity).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /users/{id}, open to any authenticated caller
pub async fn get_user(
    state: web::Data<AppState>,
    _auth: Authenticated,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = state.users.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn list_users(state: web::Data<AppState>, _admin: AdminOnly) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.users.list().await?))
}

pub async fn create_user(
    state: web::Data<AppState>,
    _admin: AdminOnly,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    let user = state.users.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

pub async fn update_user(
    state: web::Data<AppState>,
    _admin: AdminOnly,
    path: web::Path<i64>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    let user = state
        .users
        .update(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn delete_user(
    state: web::Data<AppState>,
    _admin: AdminOnly,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    state.users.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
