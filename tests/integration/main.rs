//! End-to-end tests for the relay endpoint.
//!
//! Both upstreams are replaced by local `wiremock` servers; requests go through
//! the same router `salon-relay serve` runs.

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use secrecy::Secret;
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use salon_relay::api::{cors_layer, create_router, AppState};
use salon_relay::config::Config;
use salon_relay::relay::{TelegramNotifier, YclientsCatalog};

const BOT_TOKEN: &str = "8472:TEST";
const CHAT_ID: &str = "1777987653";
const BRANCH_ID: u64 = 792033;
const SEND_PATH: &str = "/bot8472:TEST/sendMessage";
const SERVICES_PATH: &str = "/api/v1/services/792033";

fn test_config(telegram_url: &str, yclients_url: &str) -> Config {
    Config {
        telegram_bot_token: Secret::new(BOT_TOKEN.to_string()),
        telegram_chat_id: CHAT_ID.to_string(),
        telegram_api_url: telegram_url.to_string(),
        yclients_partner_token: Secret::new("t6zw-test".to_string()),
        yclients_branch_id: BRANCH_ID,
        yclients_api_url: yclients_url.to_string(),
        upstream_timeout_ms: 500,
        connect_timeout_ms: 300,
        host: "127.0.0.1".to_string(),
        port: 0,
        relay_path: "/api-proxy.php".to_string(),
        cors_allow_origin: "*".to_string(),
    }
}

fn app(config: &Config) -> Router {
    let state = AppState::new(
        TelegramNotifier::new(config).unwrap(),
        YclientsCatalog::new(config).unwrap(),
    );
    create_router(
        state,
        &config.relay_path,
        cors_layer(&config.cors_allow_origin).unwrap(),
    )
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::ORIGIN, "https://kei.example")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::ORIGIN, "https://kei.example")
        .body(Body::empty())
        .unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn assert_json_cors(response: &Response<Body>) {
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn review_is_forwarded_once_with_encoded_text() {
    let telegram = MockServer::start().await;
    let yclients = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEND_PATH))
        .and(query_param("chat_id", CHAT_ID))
        .and(query_param("text", "Отличная стрижка! 10/10 & спасибо"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&telegram)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&yclients)
        .await;

    let config = test_config(&telegram.uri(), &yclients.uri());
    let response = app(&config)
        .oneshot(post(
            "/api-proxy.php?send_review=1",
            r#"{"msg":"Отличная стрижка! 10/10 & спасибо"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_json_cors(&response);
    assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn review_without_msg_sends_empty_text() {
    let telegram = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEND_PATH))
        .and(query_param("text", ""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&telegram)
        .await;

    let config = test_config(&telegram.uri(), "http://127.0.0.1:1");
    let response = app(&config)
        .oneshot(post("/api-proxy.php?send_review", r#"{"rating":5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn review_with_malformed_json_sends_empty_text() {
    let telegram = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEND_PATH))
        .and(query_param("text", ""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&telegram)
        .await;

    let config = test_config(&telegram.uri(), "http://127.0.0.1:1");
    let response = app(&config)
        .oneshot(post("/api-proxy.php?send_review=1", "{msg: oops"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn review_with_numeric_msg_sends_its_text() {
    let telegram = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEND_PATH))
        .and(query_param("text", "5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&telegram)
        .await;

    let config = test_config(&telegram.uri(), "http://127.0.0.1:1");
    let response = app(&config)
        .oneshot(post("/api-proxy.php?send_review=1", r#"{"msg":5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn oversized_review_is_still_acknowledged_as_json() {
    let telegram = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEND_PATH))
        .and(query_param("text", ""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&telegram)
        .await;

    // Past axum's default 2 MB body limit.
    let body = format!(r#"{{"msg":"{}"}}"#, "a".repeat(3 * 1024 * 1024));
    let config = test_config(&telegram.uri(), "http://127.0.0.1:1");
    let response = app(&config)
        .oneshot(post("/api-proxy.php?send_review=1", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_json_cors(&response);
    assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn review_is_acknowledged_when_telegram_fails() {
    let telegram = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&telegram)
        .await;

    let config = test_config(&telegram.uri(), "http://127.0.0.1:1");
    let response = app(&config)
        .oneshot(post("/api-proxy.php?send_review=1", r#"{"msg":"hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_json_cors(&response);
    assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn review_is_acknowledged_when_telegram_times_out() {
    let telegram = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)))
        .mount(&telegram)
        .await;

    let config = test_config(&telegram.uri(), "http://127.0.0.1:1");
    let response = app(&config)
        .oneshot(post("/api-proxy.php?send_review=1", r#"{"msg":"hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn catalog_body_is_forwarded_verbatim() {
    let telegram = MockServer::start().await;
    let yclients = MockServer::start().await;
    // Odd spacing and key order must survive untouched.
    let payload = "{ \"success\": true,\n  \"data\": [{\"title\":\"Стрижка\",\"price_min\":1500}], \"meta\": [] }";
    Mock::given(method("GET"))
        .and(path(SERVICES_PATH))
        .and(header_eq("authorization", "Bearer t6zw-test"))
        .and(header_eq("accept", "application/vnd.yclients.v2+json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(payload))
        .expect(1)
        .mount(&yclients)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&telegram)
        .await;

    let config = test_config(&telegram.uri(), &yclients.uri());
    let response = app(&config)
        .oneshot(get("/api-proxy.php?send_reviews=1&foo=bar"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_json_cors(&response);
    assert_eq!(body_string(response).await, payload);
}

#[tokio::test]
async fn catalog_forwards_upstream_application_errors() {
    let yclients = MockServer::start().await;
    let payload = r#"{"success":false,"data":null,"meta":{"message":"Партнер не найден"}}"#;
    Mock::given(method("GET"))
        .and(path(SERVICES_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string(payload))
        .expect(1)
        .mount(&yclients)
        .await;

    let config = test_config("http://127.0.0.1:1", &yclients.uri());
    let response = app(&config).oneshot(get("/api-proxy.php")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_json_cors(&response);
    assert_eq!(body_string(response).await, payload);
}

#[tokio::test]
async fn catalog_accepts_any_method_without_flag() {
    let yclients = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SERVICES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&yclients)
        .await;

    let config = test_config("http://127.0.0.1:1", &yclients.uri());
    let response = app(&config)
        .oneshot(post("/api-proxy.php", r#"{"msg":"not a review"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "[]");
}

#[tokio::test]
async fn catalog_transport_failure_returns_error_object() {
    let config = test_config("http://127.0.0.1:1", "http://127.0.0.1:1");
    let response = app(&config).oneshot(get("/api-proxy.php")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_json_cors(&response);

    let value: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert!(object["error"].as_str().unwrap().contains("unreachable"));
}

#[tokio::test]
async fn catalog_timeout_returns_error_object() {
    let yclients = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&yclients)
        .await;

    let config = test_config("http://127.0.0.1:1", &yclients.uri());
    let response = app(&config).oneshot(get("/api-proxy.php")).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_json_cors(&response);
    assert_eq!(
        body_string(response).await,
        r#"{"error":"yclients timed out"}"#
    );
}

#[tokio::test]
async fn responses_carry_cors_without_origin_header() {
    let telegram = MockServer::start().await;
    let yclients = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&telegram)
        .await;
    Mock::given(method("GET"))
        .and(path(SERVICES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&yclients)
        .await;

    let config = test_config(&telegram.uri(), &yclients.uri());
    let app = app(&config);

    let catalog = app
        .clone()
        .oneshot(Request::builder().uri("/api-proxy.php").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(catalog.status(), StatusCode::OK);
    assert_json_cors(&catalog);
    assert_eq!(body_string(catalog).await, "[]");

    let review = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api-proxy.php?send_review=1")
                .body(Body::from(r#"{"msg":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(review.status(), StatusCode::OK);
    assert_json_cors(&review);
    assert_eq!(body_string(review).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn preflight_allows_any_origin() {
    let config = test_config("http://127.0.0.1:1", "http://127.0.0.1:1");
    let response = app(&config)
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api-proxy.php?send_review=1")
                .header(header::ORIGIN, "https://kei.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn configured_origin_is_echoed() {
    let yclients = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&yclients)
        .await;

    let mut config = test_config("http://127.0.0.1:1", &yclients.uri());
    config.cors_allow_origin = "https://kei.example".to_string();
    let response = app(&config).oneshot(get("/api-proxy.php")).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://kei.example"
    );
}
