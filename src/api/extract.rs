//! Request extractors that fail into the application error taxonomy
//! instead of axum's default plain-text rejections.

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::domain::enums::Role;
use crate::domain::errors::AppError;

/// JSON body extractor.
///
/// Reads the raw body regardless of content type (clients are not always
/// disciplined about headers), treats an empty body as `{}` so validation
/// rule sets can report every missing field, and maps syntax errors to a
/// `VALIDATION_ERROR`.
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::validation("Invalid JSON payload", serde_json::json!([])))?;

        let slice: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        let value = serde_json::from_slice(slice)
            .map_err(|_| AppError::validation("Invalid JSON payload", serde_json::json!([])))?;
        Ok(Json(value))
    }
}

/// Deserialize a validated JSON value into a typed request. Failures here
/// mean a rule set and its DTO disagree, which is a server defect.
pub fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::internal(format!("body mapping failed: {e}")))
}

/// UUID path parameter with a taxonomy rejection for malformed values.
pub struct PathId(pub Uuid);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = axum::extract::Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| invalid_id(serde_json::Value::Null))?;
        let id = Uuid::parse_str(&raw.0).map_err(|_| invalid_id(serde_json::json!(raw.0)))?;
        Ok(PathId(id))
    }
}

fn invalid_id(rejected: serde_json::Value) -> AppError {
    AppError::validation(
        "Validation failed",
        serde_json::json!([{
            "field": "id",
            "message": "Id must be a valid UUID",
            "rejectedValue": rejected,
        }]),
    )
}

/// Authenticated principal resolved by the auth middleware; valid for one
/// request only.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Access token required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_body_maps_mapping_failures_to_internal() {
        #[derive(Debug, serde::Deserialize)]
        struct Small {
            #[allow(dead_code)]
            n: u8,
        }
        let err = parse_body::<Small>(serde_json::json!({"n": "nope"})).unwrap_err();
        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
        assert!(!err.operational);
    }
}
