//! Bearer-token authentication and role guards.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::extract::CurrentUser;
use crate::api::router::AppState;
use crate::domain::enums::Role;
use crate::domain::errors::AppError;

/// Credential lifetime.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a signed credential embedding the principal, expiring in 24h.
pub fn issue_token(
    id: Uuid,
    email: &str,
    role: Role,
    secret: &str,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: id,
        email: email.to_string(),
        role,
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("token signing failed: {e}")))
}

/// Verify signature and expiry, returning the embedded claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Access token required"))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Access token required"))?;

    Ok(token)
}

fn resolve_principal(state: &AppState, headers: &HeaderMap) -> Result<CurrentUser, AppError> {
    // The config loader refuses to start without a secret; an empty one
    // here means the state bypassed that check. Fail hard rather than
    // accept unverified tokens.
    if state.config.jwt_secret.is_empty() {
        return Err(AppError::config("JWT secret not configured"));
    }

    let token = bearer_token(headers)?;
    let claims = verify_token(token, &state.config.jwt_secret)?;

    Ok(CurrentUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}

/// Authentication middleware for protected route groups. On success the
/// principal rides the request extensions (and is mirrored onto the
/// response so the terminal formatter can log the user id).
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_principal(&state, request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user.clone());
            let mut response = next.run(request).await;
            response.extensions_mut().insert(user);
            response
        }
        Err(err) => err.into_response(),
    }
}

/// Second-stage role guard. Forbidden when the principal's role is not in
/// the allowed set, or when no principal is attached at all.
pub async fn require_role(
    allowed: &'static [Role],
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|user| allowed.contains(&user.role));

    if authorized {
        next.run(request).await
    } else {
        AppError::forbidden("Insufficient permissions").into_response()
    }
}

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_tokens_verify_and_embed_principal() {
        let id = Uuid::new_v4();
        let token = issue_token(id, "ada@example.com", Role::Manager, SECRET).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let token = issue_token(Uuid::new_v4(), "a@b.co", Role::Staff, SECRET).unwrap();
        let err = verify_token(&token, "another-secret-another-secret-xx").unwrap_err();
        assert_eq!(err.message, "Invalid or expired token");
        assert_eq!(err.code, "UNAUTHORIZED");
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@b.co".to_string(),
            role: Role::Staff,
            iat: now - 2 * TOKEN_TTL_SECS,
            exp: now - TOKEN_TTL_SECS,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn bearer_extraction_requires_well_formed_header() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(axum::http::header::AUTHORIZATION, "Token abc".parse().unwrap());
        assert!(bearer_token(&headers).is_err());

        headers.insert(axum::http::header::AUTHORIZATION, "Bearer   ".parse().unwrap());
        assert!(bearer_token(&headers).is_err());

        headers.insert(axum::http::header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc");
    }
}
