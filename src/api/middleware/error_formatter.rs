//! Terminal error normalization and response formatting.
//!
//! Mounted as the second-outermost layer so every response, from any
//! stage, passes through exactly once before the correlation header is
//! attached. Errors arrive as an `AppError` stashed in response
//! extensions (typed failures, extractor rejections, `sqlx::Error`
//! conversions); anything else with an error status is synthesized from
//! the bare status code. Nothing runs downstream of this stage.

use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, info, warn};

use crate::api::extract::CurrentUser;
use crate::api::middleware::request_context::RequestContext;
use crate::api::router::AppState;
use crate::domain::errors::AppError;

pub async fn format_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let context = request.extensions().get::<RequestContext>().cloned();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let status = response.status();

    let request_id = context
        .as_ref()
        .map(|c| c.request_id.clone())
        .unwrap_or_default();
    let duration_ms = context
        .as_ref()
        .map(|c| c.started_at.elapsed().as_millis() as u64)
        .unwrap_or_default();

    if !(status.is_client_error() || status.is_server_error()) {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms,
            "request completed"
        );
        return response;
    }

    let err = response
        .extensions_mut()
        .remove::<AppError>()
        .unwrap_or_else(|| AppError::from_status(status));

    let user_id = response
        .extensions()
        .get::<CurrentUser>()
        .map(|u| u.id.to_string());

    // Operational 4xx traffic is as observable as 5xx failures.
    if err.status.is_server_error() {
        error!(
            error = err.kind,
            code = err.code,
            message = %err.message,
            status = err.status.as_u16(),
            request_id = %request_id,
            method = %method,
            path = %path,
            user_id = user_id.as_deref().unwrap_or("-"),
            duration_ms,
            details = ?err.details,
            source = err.source_detail.as_deref().unwrap_or("-"),
            "request failed"
        );
    } else {
        warn!(
            error = err.kind,
            code = err.code,
            message = %err.message,
            status = err.status.as_u16(),
            request_id = %request_id,
            method = %method,
            path = %path,
            user_id = user_id.as_deref().unwrap_or("-"),
            duration_ms,
            details = ?err.details,
            "request rejected"
        );
    }

    let envelope = build_envelope(&err, &request_id, state.config.environment.is_production());
    let mut formatted = (err.status, axum::Json(envelope)).into_response();

    // Keep headers added on the response path (Set-Cookie from CSRF
    // issuance, CORS headers); the body and its framing are replaced.
    for (name, value) in response.headers() {
        if name != CONTENT_TYPE && name != CONTENT_LENGTH {
            formatted.headers_mut().append(name, value.clone());
        }
    }

    formatted
}

/// The stable client-visible error envelope.
fn build_envelope(err: &AppError, request_id: &str, production: bool) -> serde_json::Value {
    let message = if err.operational {
        err.message.clone()
    } else {
        "Internal server error".to_string()
    };

    let mut error = json!({
        "message": message,
        "code": err.code,
        "type": err.kind,
    });

    let include_details = err.code == "VALIDATION_ERROR" || !production;
    if include_details {
        if let Some(details) = &err.details {
            error["details"] = details.clone();
        }
    }
    if !production {
        if let Some(source) = &err.source_detail {
            error["stack"] = json!(source);
        }
    }

    json!({
        "success": false,
        "statusCode": err.status.as_u16(),
        "error": error,
        "requestId": request_id,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
}
