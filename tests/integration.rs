use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use drone_courier::api::rest::router;
use drone_courier::config::Config;
use drone_courier::lifecycle::driver::run_lifecycle_driver;
use drone_courier::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

fn fast_config() -> Config {
    Config {
        http_port: 0,
        log_level: "info".to_string(),
        event_buffer_size: 64,
        arrival_delay_ms: 50,
        flight_delay_ms: 80,
        eta_tick_ms: 60_000,
        auth_latency_ms: 0,
        request_latency_ms: 0,
    }
}

fn setup() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(fast_config()));
    let events_rx = state.store.subscribe();
    tokio::spawn(run_lifecycle_driver(state.clone(), events_rx));
    (router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn post_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn register_body() -> Value {
    json!({
        "name": "Marco",
        "email": "m@x.com",
        "password": "secret1",
        "confirm_password": "secret1",
        "home_address": { "lat": 41.9028, "lng": 12.4964, "address": "Via Roma 123" }
    })
}

fn create_delivery_body() -> Value {
    json!({
        "pickup": { "lat": 41.9028, "lng": 12.4964, "address": "Via Roma 123" },
        "delivery": { "lat": 0.0, "lng": 0.0, "address": "Via Veneto 5" }
    })
}

async fn register(app: &axum::Router) {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", register_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn create_delivery(app: &axum::Router) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/deliveries", create_delivery_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["active_delivery"], false);
    assert_eq!(body["completed_deliveries"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("active_delivery"));
}

#[tokio::test]
async fn register_returns_user_with_empty_history() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request("POST", "/auth/register", register_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "Marco");
    assert_eq!(body["email"], "m@x.com");
    assert_eq!(body["delivery_history"].as_array().unwrap().len(), 0);
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn register_short_password_names_the_field() {
    let (app, _state) = setup();
    let mut body = register_body();
    body["password"] = json!("abc");
    body["confirm_password"] = json!("abc");

    let response = app
        .oneshot(json_request("POST", "/auth/register", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["field"], "password");
}

#[tokio::test]
async fn register_mismatched_confirmation_names_the_field() {
    let (app, _state) = setup();
    let mut body = register_body();
    body["confirm_password"] = json!("different");

    let response = app
        .oneshot(json_request("POST", "/auth/register", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["field"], "confirm_password");
}

#[tokio::test]
async fn login_with_empty_password_returns_401() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "m@x.com", "password": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_installs_demo_profile() {
    let (app, _state) = setup();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "marco@example.com", "password": "secret1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["email"], "marco@example.com");
    assert_eq!(body["name"], "Marco Rossi");

    let response = app.oneshot(get_request("/profile")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_clears_the_session() {
    let (app, _state) = setup();
    register(&app).await;

    let response = app
        .clone()
        .oneshot(post_request("/auth/logout"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get_request("/profile")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_profile_merges_fields() {
    let (app, _state) = setup();
    register(&app).await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/profile",
            json!({ "name": "Marco R.", "avatar": "avatar.png" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "Marco R.");
    assert_eq!(body["email"], "m@x.com");
    assert_eq!(body["avatar"], "avatar.png");
}

#[tokio::test]
async fn create_delivery_requires_authentication() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request("POST", "/deliveries", create_delivery_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_delivery_starts_arriving_with_assigned_drone() {
    let (app, _state) = setup();
    register(&app).await;

    let body = create_delivery(&app).await;
    assert_eq!(body["status"], "Arriving");
    assert_eq!(body["drone_id"], "DRN-001");
    assert_eq!(body["eta_minutes"], 15);
}

#[tokio::test]
async fn second_create_delivery_conflicts() {
    let (app, _state) = setup();
    register(&app).await;
    create_delivery(&app).await;

    let response = app
        .oneshot(json_request("POST", "/deliveries", create_delivery_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn skipping_a_state_returns_invalid_transition() {
    let (app, state) = setup();
    register(&app).await;
    create_delivery(&app).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/deliveries/status",
            json!({ "status": "InFlight" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["from"], "Arriving");
    assert_eq!(body["attempted"], "InFlight");
    assert_eq!(state.metrics.transitions_rejected_total.get(), 1);
}

#[tokio::test]
async fn confirm_pickup_before_arrival_is_rejected() {
    let (app, _state) = setup();
    register(&app).await;
    create_delivery(&app).await;

    let response = app
        .oneshot(post_request("/deliveries/confirm-pickup"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn full_delivery_lifecycle() {
    let (app, _state) = setup();
    register(&app).await;
    create_delivery(&app).await;

    // Arrival timer fires after 50ms in this config.
    tokio::time::sleep(tokio::time::Duration::from_millis(150)).await;

    let response = app
        .clone()
        .oneshot(get_request("/deliveries/active"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "PendingPickup");

    let response = app
        .clone()
        .oneshot(post_request("/deliveries/confirm-pickup"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "InFlight");
    assert_eq!(body["eta_minutes"], 10);

    // Flight timer fires after 80ms.
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let response = app
        .clone()
        .oneshot(get_request("/deliveries/active"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body.is_null());

    let response = app
        .clone()
        .oneshot(get_request("/deliveries/history"))
        .await
        .unwrap();
    let history = body_json(response).await;
    let list = history.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["status"], "Delivered");

    let response = app.clone().oneshot(get_request("/drone")).await.unwrap();
    let drone = body_json(response).await;
    assert_eq!(drone["status"], "Idle");

    let response = app.oneshot(get_request("/health")).await.unwrap();
    let health = body_json(response).await;
    assert_eq!(health["active_delivery"], false);
    assert_eq!(health["completed_deliveries"], 1);
}

#[tokio::test]
async fn drone_is_idle_without_an_active_delivery() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/drone")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], "DRN-001");
    assert_eq!(body["status"], "Idle");
    assert!(body["eta_minutes"].is_null());
}

#[tokio::test]
async fn stale_timer_does_not_touch_a_cleared_session() {
    let (app, _state) = setup();
    register(&app).await;
    create_delivery(&app).await;

    // Clear the session before the arrival timer can fire.
    let response = app
        .clone()
        .oneshot(post_request("/auth/logout"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    tokio::time::sleep(tokio::time::Duration::from_millis(150)).await;

    register(&app).await;
    let body = create_delivery(&app).await;
    assert_eq!(body["status"], "Arriving");

    let response = app
        .oneshot(get_request("/deliveries/history"))
        .await
        .unwrap();
    let history = body_json(response).await;
    assert_eq!(history.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn delivery_after_a_completed_one_succeeds() {
    let (app, _state) = setup();
    register(&app).await;
    create_delivery(&app).await;

    tokio::time::sleep(tokio::time::Duration::from_millis(150)).await;
    let response = app
        .clone()
        .oneshot(post_request("/deliveries/confirm-pickup"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let body = create_delivery(&app).await;
    assert_eq!(body["status"], "Arriving");

    let response = app
        .oneshot(get_request("/deliveries/history"))
        .await
        .unwrap();
    let history = body_json(response).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}
