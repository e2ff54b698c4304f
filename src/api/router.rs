//! Router assembly and shared application state.
//!
//! Layer order matters. `Router::layer` wraps outside-in, so the last
//! layer added runs first. From the wire inward the pipeline is:
//! request context, error formatter, CORS, panic catcher, rate limiter,
//! CSRF issue, CSRF verify, body normalizer, then routing (where the auth
//! guard sits on the protected group).

use std::sync::Arc;
use std::time::Duration;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::PgPool;
use tower_http::catch_panic::CatchPanicLayer;

use crate::api::handlers::{
    auth, burials, contracts, customers, financial, grants, health, inventory, work_orders,
};
use crate::api::middleware::{
    auth as auth_mw, cors, csrf, error_formatter, normalize, rate_limit, request_context,
};
use crate::config::Config;
use crate::domain::errors::AppError;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}

fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("request handler panicked");
    AppError::internal("Internal server error").into_response()
}

async fn fallback() -> AppError {
    AppError::not_found("Route not found")
}

/// Build the full application router with every middleware mounted.
pub fn create_router(state: AppState) -> Router {
    let window = Duration::from_secs(state.config.rate_limit_window_secs);
    let general_limiter = rate_limit::RateLimiter::new(state.config.rate_limit_max, window);
    let auth_limiter = rate_limit::RateLimiter::new(state.config.auth_rate_limit_max, window);

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/csrf-token", get(auth::csrf_token))
        .route(
            "/auth/login",
            post(auth::login).route_layer(from_fn_with_state(auth_limiter, rate_limit::rate_limit)),
        );

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/auth/register",
            post(auth::register).route_layer(from_fn(|req, next| {
                auth_mw::require_role(auth_mw::ADMIN_ONLY, req, next)
            })),
        )
        .route(
            "/work-orders",
            get(work_orders::list).post(work_orders::create),
        )
        .route(
            "/work-orders/{id}",
            get(work_orders::get)
                .put(work_orders::update)
                .delete(work_orders::remove),
        )
        .route("/inventory", get(inventory::list).post(inventory::create))
        .route(
            "/inventory/{id}",
            get(inventory::get)
                .put(inventory::update)
                .delete(inventory::remove),
        )
        .route("/burials", get(burials::list).post(burials::create))
        .route(
            "/burials/{id}",
            get(burials::get).put(burials::update).delete(burials::remove),
        )
        .route("/contracts", get(contracts::list).post(contracts::create))
        .route(
            "/contracts/{id}",
            get(contracts::get)
                .put(contracts::update)
                .delete(contracts::remove),
        )
        .route("/grants", get(grants::list).post(grants::create))
        .route(
            "/grants/{id}",
            get(grants::get).put(grants::update).delete(grants::remove),
        )
        .route("/customers", get(customers::list).post(customers::create))
        .route(
            "/customers/{id}",
            get(customers::get)
                .put(customers::update)
                .delete(customers::remove),
        )
        .route(
            "/financial/deposits",
            get(financial::list_deposits).post(financial::create_deposit),
        )
        .route(
            "/financial/deposits/{id}",
            put(financial::update_deposit).delete(financial::remove_deposit),
        )
        .route(
            "/financial/receivables",
            get(financial::list_receivables).post(financial::create_receivable),
        )
        .route(
            "/financial/receivables/{id}",
            put(financial::update_receivable).delete(financial::remove_receivable),
        )
        .route(
            "/financial/payables",
            get(financial::list_payables).post(financial::create_payable),
        )
        .route(
            "/financial/payables/{id}",
            put(financial::update_payable).delete(financial::remove_payable),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_mw::authenticate));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(fallback)
        .layer(from_fn(normalize::normalize_request))
        .layer(from_fn(csrf::verify_token))
        .layer(from_fn_with_state(state.clone(), csrf::issue_token))
        .layer(from_fn_with_state(general_limiter, rate_limit::rate_limit))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors::create_cors_layer(&state.config))
        .layer(from_fn_with_state(state.clone(), error_formatter::format_errors))
        .layer(from_fn(request_context::request_context))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Environment;

    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost/sexton_test".to_string(),
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            listen_addr: "127.0.0.1:0".to_string(),
            environment: Environment::Test,
            allowed_origins: vec![],
            db_max_connections: 2,
            db_min_connections: 0,
            db_acquire_timeout_secs: 1,
            rate_limit_max: 300,
            auth_rate_limit_max: 10,
            rate_limit_window_secs: 900,
        };
        let pool = PgPool::connect_lazy(&config.database_url).unwrap();
        AppState::new(pool, config)
    }

    #[tokio::test]
    async fn unknown_route_gets_enveloped_404() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/no-such-route")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/work-orders")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
