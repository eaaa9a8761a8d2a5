use crate::app_state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "product-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /products/health, with the state of the user-service breaker
pub async fn products_health(state: web::Data<AppState>) -> HttpResponse {
    let circuit = state.products.users().circuit();
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "product-service",
        "dependencies": {
            "user_service": {
                "circuit_state": circuit.state.as_str().to_ascii_lowercase(),
                "failure_rate": circuit.failure_rate,
                "calls_in_window": circuit.calls_in_window
            }
        }
    }))
}
