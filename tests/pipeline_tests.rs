//! End-to-end pipeline tests driven through `tower::ServiceExt::oneshot`.
//!
//! The pool is created lazily and no test here depends on a reachable
//! database; everything asserted is produced by the middleware pipeline
//! before a query would run (or by the error formatter after a
//! connection failure).

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use sexton::api::middleware::auth::issue_token;
use sexton::api::router::AppState;
use sexton::config::{Config, Environment};
use sexton::create_router;
use sexton::domain::enums::Role;

const TEST_SECRET: &str = "test-secret-test-secret-test-secret!";

fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost:1/sexton_unreachable".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        environment: Environment::Test,
        allowed_origins: vec![],
        db_max_connections: 2,
        db_min_connections: 0,
        db_acquire_timeout_secs: 1,
        rate_limit_max: 300,
        auth_rate_limit_max: 10,
        rate_limit_window_secs: 900,
    }
}

fn app() -> Router {
    let config = test_config();
    let pool = PgPool::connect_lazy(&config.database_url).unwrap();
    create_router(AppState::new(pool, config))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Fetch a CSRF token plus its cookie pair from the token endpoint.
async fn csrf_pair(app: &Router) -> (String, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/csrf-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let token = cookie.split_once('=').unwrap().1.to_string();
    (cookie, token)
}

fn bearer(role: Role) -> String {
    let token = issue_token(Uuid::new_v4(), "tester@example.com", role, TEST_SECRET).unwrap();
    format!("Bearer {token}")
}

#[tokio::test]
async fn health_answers_without_auth_or_csrf() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn request_id_header_is_echoed_back() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "trace-me-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-me-42"
    );
}

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let id = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn unknown_route_yields_enveloped_404_with_request_id() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/nope")
                .header("x-request-id", "req-404")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["requestId"], "req-404");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn protected_routes_reject_missing_token() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/work-orders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["message"], "Access token required");
}

#[tokio::test]
async fn garbage_bearer_token_is_unauthorized() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/work-orders")
                .header(header::AUTHORIZATION, "Bearer not.a.jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Invalid or expired token");
}

#[tokio::test]
async fn mutating_request_without_csrf_is_forbidden() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert_eq!(
        body["error"]["message"],
        "CSRF token missing, refresh the page and try again"
    );
}

#[tokio::test]
async fn mismatched_csrf_pair_is_forbidden() {
    let app = app();
    let (cookie, _token) = csrf_pair(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::COOKIE, cookie)
                .header("x-csrf-token", "0000")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "CSRF token invalid");
}

#[tokio::test]
async fn csrf_cookie_is_issued_on_first_contact() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("csrf-token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
}

#[tokio::test]
async fn empty_login_body_reports_every_missing_field() {
    let app = app();
    let (cookie, token) = csrf_pair(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::COOKIE, cookie)
                .header("x-csrf-token", token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let details = body["error"]["details"].as_array().unwrap();
    let fields: Vec<&str> = details
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
    assert_eq!(details[0]["message"], "Email is required");
    assert_eq!(details[0]["rejectedValue"], Value::Null);
}

#[tokio::test]
async fn oversized_body_is_rejected_as_payload_too_large() {
    let app = app();
    let (cookie, token) = csrf_pair(&app).await;

    // Just over the 2 MiB buffering cap, syntactically valid JSON.
    let padding = "x".repeat(2 * 1024 * 1024);
    let oversized = format!("{{\"notes\": \"{padding}\"}}");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::COOKIE, cookie)
                .header("x-csrf-token", token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(oversized))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert!(body["requestId"].is_string());
}

#[tokio::test]
async fn invalid_json_body_is_a_validation_error() {
    let app = app();
    let (cookie, token) = csrf_pair(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::COOKIE, cookie)
                .header("x-csrf-token", token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn non_admin_cannot_register_users() {
    let app = app();
    let (cookie, token) = csrf_pair(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::AUTHORIZATION, bearer(Role::Staff))
                .header(header::COOKIE, cookie)
                .header("x-csrf-token", token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Insufficient permissions");
}

#[tokio::test]
async fn auth_rate_limit_kicks_in_after_budget() {
    let app = app();
    let (cookie, token) = csrf_pair(&app).await;

    for _ in 0..10 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header(header::COOKIE, cookie.clone())
                    .header("x-csrf-token", token.clone())
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::COOKIE, cookie)
                .header("x-csrf-token", token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn database_failure_flows_through_the_envelope() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/customers")
                .header(header::AUTHORIZATION, bearer(Role::Admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Unreachable database: a connection error (500) or, if the pool kept
    // retrying past its deadline, a timeout (408).
    let status = response.status();
    assert!(
        status == StatusCode::INTERNAL_SERVER_ERROR || status == StatusCode::REQUEST_TIMEOUT,
        "unexpected status {status}"
    );

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["requestId"].is_string());
    assert_ne!(body["error"]["message"], "");
}

#[tokio::test]
async fn invalid_path_id_is_a_validation_error() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/customers/not-a-uuid")
                .header(header::AUTHORIZATION, bearer(Role::Admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
