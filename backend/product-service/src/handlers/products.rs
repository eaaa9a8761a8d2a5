use crate::app_state::AppState;
use crate::clients::CallContext;
use crate::error::Result;
use crate::models::ProductRequest;
use actix_middleware::{AdminOnly, Authenticated, BearerToken, CorrelationId, RequestDeadline};
use actix_web::{web, HttpResponse};

pub async fn list_products(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.products.list().await?))
}

pub async fn list_available(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.products.list_available().await?))
}

/// The caller's token and correlation id travel with a creator lookup, and
/// the lookup gives up when the request deadline passes.
fn call_context(
    bearer: Option<BearerToken>,
    correlation_id: CorrelationId,
    deadline: RequestDeadline,
) -> CallContext {
    CallContext {
        bearer: bearer.map(|b| b.0),
        correlation_id: Some(correlation_id.0),
        deadline: deadline.instant(),
    }
}

/// GET /products/{id}
pub async fn get_product(
    state: web::Data<AppState>,
    _auth: Authenticated,
    bearer: Option<BearerToken>,
    correlation_id: CorrelationId,
    deadline: RequestDeadline,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let ctx = call_context(bearer, correlation_id, deadline);
    let product = state
        .products
        .get_with_creator(path.into_inner(), &ctx)
        .await?;
    Ok(HttpResponse::Ok().json(product))
}

/// GET /products/user/{user_id}
pub async fn list_by_user(
    state: web::Data<AppState>,
    _auth: Authenticated,
    bearer: Option<BearerToken>,
    correlation_id: CorrelationId,
    deadline: RequestDeadline,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let ctx = call_context(bearer, correlation_id, deadline);
    let listing = state
        .products
        .list_by_creator(path.into_inner(), &ctx)
        .await?;
    Ok(HttpResponse::Ok().json(listing))
}

pub async fn create_product(
    state: web::Data<AppState>,
    _admin: AdminOnly,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse> {
    let product = state.products.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

pub async fn update_product(
    state: web::Data<AppState>,
    _admin: AdminOnly,
    path: web::Path<i64>,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse> {
    let product = state
        .products
        .update(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn delete_product(
    state: web::Data<AppState>,
    _admin: AdminOnly,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    state.products.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
