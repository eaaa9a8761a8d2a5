//! Request deadline middleware
//!
//! Stamps each request with the instant by which its response is due.
//! Handlers hand the deadline to outbound calls so retries and backoff stop
//! once the inbound request can no longer use their result.

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::time::Duration;
use tokio::time::Instant;

/// Deadline of the current request, `None` when no middleware set one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDeadline(pub Option<Instant>);

impl RequestDeadline {
    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|at| at.saturating_duration_since(Instant::now()))
    }
}

impl FromRequest for RequestDeadline {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<RequestDeadline>()
            .copied()
            .unwrap_or(RequestDeadline(None))))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeadlineMiddleware {
    budget: Duration,
}

impl DeadlineMiddleware {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }
}

impl<S, B> Transform<S, ServiceRequest> for DeadlineMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = DeadlineMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(DeadlineMiddlewareService {
            service,
            budget: self.budget,
        }))
    }
}

pub struct DeadlineMiddlewareService<S> {
    service: S,
    budget: Duration,
}

impl<S, B> Service<ServiceRequest> for DeadlineMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        req.extensions_mut()
            .insert(RequestDeadline(Some(Instant::now() + self.budget)));
        Box::pin(self.service.call(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    async fn remaining_ms(deadline: RequestDeadline) -> HttpResponse {
        match deadline.remaining() {
            Some(left) => HttpResponse::Ok().body(left.as_millis().to_string()),
            None => HttpResponse::Ok().body("none"),
        }
    }

    #[actix_web::test]
    async fn test_deadline_is_stamped() {
        let app = test::init_service(
            App::new()
                .wrap(DeadlineMiddleware::new(Duration::from_secs(8)))
                .route("/", web::get().to(remaining_ms)),
        )
        .await;

        let body = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
        let left: u128 = std::str::from_utf8(&body).unwrap().parse().unwrap();
        assert!(left > 7_000 && left <= 8_000);
    }

    #[actix_web::test]
    async fn test_no_middleware_means_no_deadline() {
        let app = test::init_service(App::new().route("/", web::get().to(remaining_ms))).await;

        let body = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(body, "none");
    }
}
