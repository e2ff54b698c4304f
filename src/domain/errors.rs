//! Application error taxonomy.
//!
//! Every failure source (validation, auth, database driver, unexpected
//! panic) is normalized into one [`AppError`] before a response is written.
//! Operational errors are expected and surface their own message;
//! non-operational errors indicate a programming or infrastructure defect
//! and must never leak details to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

/// Canonical application error carried through the middleware pipeline.
#[derive(Debug, Clone)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    /// Error class name exposed as `error.type` in the envelope.
    pub kind: &'static str,
    pub message: String,
    pub details: Option<Value>,
    /// Expected/recoverable failure (bad input, not-found, conflict) as
    /// opposed to a programmer or infrastructure defect.
    pub operational: bool,
    /// Internal diagnostic text (driver message, panic payload). Logged
    /// always, exposed to clients only outside production.
    pub source_detail: Option<String>,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, kind: &'static str, message: String) -> Self {
        Self {
            status,
            code,
            kind,
            message,
            details: None,
            operational: true,
            source_detail: None,
        }
    }

    /// 400 with the ordered field-failure list as details.
    pub fn validation(message: impl Into<String>, details: Value) -> Self {
        let mut err = Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "ValidationError",
            message.into(),
        );
        err.details = Some(details);
        err
    }

    /// 400 with a constraint-level code (`NOT_NULL_VIOLATION`,
    /// `CHECK_VIOLATION`, `INVALID_INPUT`).
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, "BadRequestError", message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "UnauthorizedError",
            message.into(),
        )
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "ForbiddenError",
            message.into(),
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "NotFoundError",
            message.into(),
        )
    }

    /// 409 with either `CONFLICT` or `FOREIGN_KEY_CONFLICT`.
    pub fn conflict(code: &'static str, message: impl Into<String>, details: Option<Value>) -> Self {
        let mut err = Self::new(StatusCode::CONFLICT, code, "ConflictError", message.into());
        err.details = details;
        err
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::REQUEST_TIMEOUT,
            "TIMEOUT",
            "TimeoutError",
            message.into(),
        )
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "RateLimitError",
            message.into(),
        )
    }

    /// 500 database fault; non-operational, details never leave the server.
    pub fn database(source_detail: impl Into<String>) -> Self {
        let mut err = Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            "DatabaseError",
            "Internal server error".to_string(),
        );
        err.operational = false;
        err.source_detail = Some(source_detail.into());
        err
    }

    /// 500 catch-all for unexpected failures; non-operational.
    pub fn internal(source_detail: impl Into<String>) -> Self {
        let mut err = Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "InternalServerError",
            "Internal server error".to_string(),
        );
        err.operational = false;
        err.source_detail = Some(source_detail.into());
        err
    }

    /// Server misconfiguration detected at request time (e.g. auth invoked
    /// without a signing secret). Fatal class, never accepted silently.
    pub fn config(source_detail: impl Into<String>) -> Self {
        let mut err = Self::internal(source_detail);
        err.kind = "ConfigurationError";
        err
    }

    /// Synthesize an error for a bare status produced outside the taxonomy
    /// (router 405s, panics converted upstream).
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::not_found("Route not found"),
            StatusCode::UNAUTHORIZED => Self::unauthorized("Authentication required"),
            StatusCode::FORBIDDEN => Self::forbidden("Access denied"),
            StatusCode::REQUEST_TIMEOUT => Self::timeout("Request timed out"),
            StatusCode::METHOD_NOT_ALLOWED => Self::new(
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                "MethodNotAllowedError",
                "Method not allowed".to_string(),
            ),
            StatusCode::PAYLOAD_TOO_LARGE => Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "PayloadTooLargeError",
                "Payload too large".to_string(),
            ),
            StatusCode::TOO_MANY_REQUESTS => {
                Self::too_many_requests("Too many requests, please try again later")
            }
            status if status.is_client_error() => Self::new(
                status,
                "BAD_REQUEST",
                "BadRequestError",
                status
                    .canonical_reason()
                    .unwrap_or("Bad request")
                    .to_string(),
            ),
            _ => Self::internal(format!("unexpected status {status}")),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.code, self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Produce a provisional response carrying the typed error in its
    /// extensions. The terminal formatter rewrites the body into the full
    /// envelope (request id, timestamp, environment-aware detail gating).
    fn into_response(self) -> Response {
        let status = self.status;
        let body = json!({
            "success": false,
            "statusCode": status.as_u16(),
            "error": {
                "message": if self.operational { self.message.clone() } else { "Internal server error".to_string() },
                "code": self.code,
                "type": self.kind,
            },
        });
        let mut response = (status, axum::Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Map a PostgreSQL SQLSTATE to a taxonomy error. First matching rule wins;
/// unrecognized codes fall through to the non-operational database fault.
pub fn classify_sqlstate(
    code: &str,
    constraint: Option<&str>,
    table: Option<&str>,
    column: Option<&str>,
) -> AppError {
    let db_details = || {
        Some(json!({
            "dbCode": code,
            "constraint": constraint,
            "table": table,
            "column": column,
        }))
    };

    match code {
        // unique_violation
        "23505" => AppError::conflict("CONFLICT", "Resource already exists", db_details()),
        // foreign_key_violation
        "23503" => AppError::conflict(
            "FOREIGN_KEY_CONFLICT",
            "Related resource constraint violated",
            db_details(),
        ),
        // not_null_violation
        "23502" => AppError::bad_request("NOT_NULL_VIOLATION", "A required field is missing"),
        // check_violation
        "23514" => AppError::bad_request("CHECK_VIOLATION", "A field value is out of range"),
        // invalid_text_representation
        "22P02" => AppError::bad_request("INVALID_INPUT", "Invalid input syntax"),
        other => AppError::database(format!("unhandled database error code {other}")),
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                if let Some(code) = db.code() {
                    let pg = db.try_downcast_ref::<sqlx::postgres::PgDatabaseError>();
                    classify_sqlstate(
                        code.as_ref(),
                        pg.and_then(|e| e.constraint()),
                        pg.and_then(|e| e.table()),
                        pg.and_then(|e| e.column()),
                    )
                } else {
                    AppError::database(db.to_string())
                }
            }
            sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
            // Connection-acquisition failure, distinct from query failure;
            // safe to retry at the caller's discretion.
            sqlx::Error::PoolTimedOut => AppError::timeout("Database connection timed out"),
            other => AppError::database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err = classify_sqlstate("23505", Some("users_email_key"), Some("users"), None);
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "CONFLICT");
        let details = err.details.unwrap();
        assert_eq!(details["table"], "users");
        assert_eq!(details["constraint"], "users_email_key");
        assert!(err.operational);
    }

    #[test]
    fn foreign_key_violation_keeps_details_shape() {
        let err = classify_sqlstate("23503", Some("fk_customer"), Some("burials"), Some("customer_id"));
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "FOREIGN_KEY_CONFLICT");
        assert_eq!(err.details.unwrap()["column"], "customer_id");
    }

    #[test]
    fn constraint_level_codes_map_to_bad_request() {
        for (code, expected) in [
            ("23502", "NOT_NULL_VIOLATION"),
            ("23514", "CHECK_VIOLATION"),
            ("22P02", "INVALID_INPUT"),
        ] {
            let err = classify_sqlstate(code, None, None, None);
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.code, expected);
        }
    }

    #[test]
    fn unknown_code_is_non_operational_database_error() {
        let err = classify_sqlstate("40001", None, None, None);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "DATABASE_ERROR");
        assert!(!err.operational);
        // The client-facing message stays generic.
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn pool_timeout_maps_to_timeout() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(err.code, "TIMEOUT");
    }

    #[test]
    fn from_status_covers_router_fallthroughs() {
        let err = AppError::from_status(StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
        let err = AppError::from_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
        assert!(!err.operational);
    }
}
