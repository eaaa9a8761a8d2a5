use actix_middleware::{CorrelationIdMiddleware, CORRELATION_ID_HEADER};
use actix_web::{http::StatusCode, test, web, App};
use crypto_core::TokenCodec;
use product_service::clients::UserClient;
use product_service::config::UserServiceSettings;
use product_service::db::{InMemoryProductRepository, ProductRepository};
use product_service::models::ProductRequest;
use product_service::{configure, json_config, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// FOR TESTING ONLY
const TEST_SECRET: &[u8] = b"k3Jp9QzX7vR2mW8tL5yN4bH6cF1dG0sA";

fn settings(base_url: &str, retry_attempts: u32) -> UserServiceSettings {
    UserServiceSettings {
        base_url: base_url.to_string(),
        timeout: Duration::from_millis(200),
        cb_open: Duration::from_secs(30),
        retry_attempts,
        retry_backoff: Duration::from_millis(10),
        ..Default::default()
    }
}

async fn state(
    settings: UserServiceSettings,
    request_deadline: Duration,
) -> (AppState, Arc<TokenCodec>) {
    let codec = Arc::new(TokenCodec::new(TEST_SECRET).unwrap());
    let repo = Arc::new(InMemoryProductRepository::new());
    repo.insert(ProductRequest {
        name: "Lamp".into(),
        description: Some("Desk lamp".into()),
        price: 19.9,
        stock: 3,
        category: Some("home".into()),
        created_by: 7,
    })
    .await
    .unwrap();

    let users = Arc::new(UserClient::new(&settings.base_url, settings.service_config()));
    let state = AppState::new(repo, users, codec.clone(), request_deadline);
    (state, codec)
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(json_config())
                .wrap($state.auth_middleware())
                .wrap($state.deadline_middleware())
                .wrap(CorrelationIdMiddleware)
                .configure(configure),
        )
        .await
    };
}

fn user_token(codec: &TokenCodec, roles: &[&str]) -> String {
    let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    codec
        .mint("a@x.com", &roles, Duration::from_secs(3600))
        .unwrap()
}

fn get_product(token: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri("/products/1")
        .insert_header(("Authorization", format!("Bearer {token}")))
}

fn user_json() -> Value {
    json!({
        "id": 7,
        "name": "Ana",
        "email": "ana@x.com",
        "phone": null,
        "address": null,
        "roles": ["ROLE_USER"],
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

#[actix_web::test]
async fn test_creator_fetched_with_forwarded_token_and_correlation_id() {
    let server = MockServer::start().await;
    let (state, codec) = state(settings(&server.uri(), 3), Duration::from_secs(8)).await;
    let token = user_token(&codec, &["ROLE_USER"]);

    Mock::given(method("GET"))
        .and(path("/users/7"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .and(header(CORRELATION_ID_HEADER, "corr-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let app = app!(state);
    let req = get_product(&token)
        .insert_header((CORRELATION_ID_HEADER, "corr-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(CORRELATION_ID_HEADER).unwrap(), "corr-1");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["available"], true);
    assert_eq!(body["created_by_user"]["name"], "Ana");
    assert_eq!(body["created_by_user"]["degraded"], false);
    assert!(body["created_by_user"].get("degraded_reason").is_none());
}

#[actix_web::test]
async fn test_breaker_opens_after_six_of_ten_failures() {
    let server = MockServer::start().await;
    let (state, codec) = state(settings(&server.uri(), 1), Duration::from_secs(8)).await;
    let token = user_token(&codec, &["ROLE_USER"]);

    // First six calls fail, the next four succeed
    Mock::given(method("GET"))
        .and(path("/users/7"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(6)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .with_priority(2)
        .mount(&server)
        .await;

    let app = app!(state);
    for _ in 0..10 {
        let resp = test::call_service(&app, get_product(&token).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 10);

    let resp = test::call_service(&app, get_product(&token).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["created_by_user"]["id"], 7);
    assert_eq!(body["created_by_user"]["degraded"], true);
    assert_eq!(body["created_by_user"]["degraded_reason"], "circuit_open");

    // Short-circuited: no eleventh request reached the peer
    assert_eq!(server.received_requests().await.unwrap().len(), 10);

    let req = test::TestRequest::get().uri("/products/health").to_request();
    let health: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let circuit = &health["dependencies"]["user_service"];
    assert_eq!(circuit["circuit_state"], "open");
}

#[actix_web::test]
async fn test_missing_user_degrades_without_retry_or_failure() {
    let server = MockServer::start().await;
    let (state, codec) = state(settings(&server.uri(), 3), Duration::from_secs(8)).await;
    let token = user_token(&codec, &["ROLE_USER"]);

    Mock::given(method("GET"))
        .and(path("/users/7"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let app = app!(state);
    let body: Value =
        test::read_body_json(test::call_service(&app, get_product(&token).to_request()).await).await;
    assert_eq!(body["created_by_user"]["degraded_reason"], "not_found");

    let req = test::TestRequest::get().uri("/products/health").to_request();
    let health: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(health["dependencies"]["user_service"]["circuit_state"], "closed");
    assert_eq!(health["dependencies"]["user_service"]["failure_rate"], 0.0);
}

#[actix_web::test]
async fn test_failing_peer_is_retried_then_unavailable() {
    let server = MockServer::start().await;
    let (state, codec) = state(settings(&server.uri(), 3), Duration::from_secs(8)).await;
    let token = user_token(&codec, &["ROLE_USER"]);

    Mock::given(method("GET"))
        .and(path("/users/7"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let app = app!(state);
    let body: Value =
        test::read_body_json(test::call_service(&app, get_product(&token).to_request()).await).await;
    assert_eq!(body["created_by_user"]["degraded_reason"], "unavailable");

    // Three attempts, one breaker outcome
    let req = test::TestRequest::get().uri("/products/health").to_request();
    let health: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(health["dependencies"]["user_service"]["calls_in_window"], 1);
}

#[actix_web::test]
async fn test_request_deadline_bounds_the_lookup() {
    let server = MockServer::start().await;
    let mut slow = settings(&server.uri(), 3);
    slow.timeout = Duration::from_secs(2);
    let (state, codec) = state(slow, Duration::from_millis(150)).await;
    let token = user_token(&codec, &["ROLE_USER"]);

    Mock::given(method("GET"))
        .and(path("/users/7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(user_json())
                .set_delay(Duration::from_secs(1)),
        )
        .mount(&server)
        .await;

    let app = app!(state);
    let started = std::time::Instant::now();
    let body: Value =
        test::read_body_json(test::call_service(&app, get_product(&token).to_request()).await).await;
    assert_eq!(body["created_by_user"]["degraded_reason"], "deadline_exceeded");
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[actix_web::test]
async fn test_public_routes_need_no_token_and_no_peer() {
    let server = MockServer::start().await;
    let (state, _) = state(settings(&server.uri(), 3), Duration::from_secs(8)).await;
    let app = app!(state);

    for uri in ["/products", "/products/available", "/products/health", "/health"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
    assert!(server.received_requests().await.unwrap().is_empty());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/products/1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_admin_routes() {
    let server = MockServer::start().await;
    let (state, codec) = state(settings(&server.uri(), 3), Duration::from_secs(8)).await;
    let app = app!(state);
    let user = user_token(&codec, &["ROLE_USER"]);
    let admin = user_token(&codec, &["ROLE_ADMIN"]);

    let body = json!({ "name": "Chair", "price": 40.0, "stock": 0, "created_by": 7 });
    let req = test::TestRequest::post()
        .uri("/products")
        .insert_header(("Authorization", format!("Bearer {user}")))
        .set_json(&body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/products")
        .insert_header(("Authorization", format!("Bearer {admin}")))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["available"], false);

    let invalid = json!({ "name": "Chair", "price": -1.0, "stock": 1, "created_by": 7 });
    let req = test::TestRequest::post()
        .uri("/products")
        .insert_header(("Authorization", format!("Bearer {admin}")))
        .set_json(&invalid)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = test::read_body_json(resp).await;
    assert_eq!(err["status"], 400);

    let req = test::TestRequest::get().uri("/products/available").to_request();
    let available: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(available.as_array().map(Vec::len), Some(1));

    let req = test::TestRequest::delete()
        .uri("/products/2")
        .insert_header(("Authorization", format!("Bearer {admin}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri("/products/user/7")
        .insert_header(("Authorization", format!("Bearer {user}")))
        .to_request();
    let mine: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(mine["products"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn test_products_by_user_look_up_creator_once() {
    let server = MockServer::start().await;
    let (state, codec) = state(settings(&server.uri(), 3), Duration::from_secs(8)).await;
    let token = user_token(&codec, &["ROLE_USER"]);

    Mock::given(method("GET"))
        .and(path("/users/7"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let app = app!(state);
    let req = test::TestRequest::get()
        .uri("/products/user/7")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["name"], "Ana");
    assert_eq!(body["user"]["degraded"], false);
    assert_eq!(body["products"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["products"][0]["name"], "Lamp");
}

#[actix_web::test]
async fn test_products_by_user_survive_a_failing_peer() {
    let server = MockServer::start().await;
    let (state, codec) = state(settings(&server.uri(), 1), Duration::from_secs(8)).await;
    let token = user_token(&codec, &["ROLE_USER"]);

    Mock::given(method("GET"))
        .and(path("/users/999"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let app = app!(state);
    let req = test::TestRequest::get()
        .uri("/products/user/999")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["id"], 999);
    assert_eq!(body["user"]["degraded_reason"], "unavailable");
    assert_eq!(body["products"], json!([]));

    let req = test::TestRequest::get().uri("/products/health").to_request();
    let health: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(health["dependencies"]["user_service"]["calls_in_window"], 1);
}

#[actix_web::test]
async fn test_missing_product_is_404() {
    let server = MockServer::start().await;
    let (state, codec) = state(settings(&server.uri(), 3), Duration::from_secs(8)).await;
    let app = app!(state);
    let token = user_token(&codec, &["ROLE_USER"]);

    let req = test::TestRequest::get()
        .uri("/products/99")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(server.received_requests().await.unwrap().is_empty());
}
