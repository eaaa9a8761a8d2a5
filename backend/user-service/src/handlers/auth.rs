use crate::app_state::AppState;
use crate::error::Result;
use crate::models::{LoginRequest, RegisterRequest};
use actix_web::{web, HttpResponse};

/// POST /auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let resp = state.auth.login(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(resp))
}

/// POST /auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let resp = state.auth.register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(resp))
}
