//! CSRF protection via the double-submit-cookie pattern.
//!
//! An unguessable token lives in an httpOnly cookie; every state-mutating
//! request must echo it in the `x-csrf-token` header. No server-side
//! session storage is involved.

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rand::RngCore;

use crate::api::router::AppState;
use crate::domain::errors::AppError;

pub const CSRF_COOKIE: &str = "csrf-token";
pub const CSRF_HEADER: &str = "x-csrf-token";

const COOKIE_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// 256 bits of randomness, hex-encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Read one cookie value from the `Cookie` header.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Build the `Set-Cookie` value for a freshly minted token.
pub fn set_cookie_value(token: &str, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{CSRF_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={COOKIE_MAX_AGE_SECS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// Token issuance. Runs on every request, safe and unsafe methods alike.
/// Idempotent: an existing cookie is never overwritten.
pub async fn issue_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let existing = cookie_value(request.headers(), CSRF_COOKIE).map(|s| s.to_string());
    let mut response = next.run(request).await;

    // A handler (the token endpoint) may already have set the cookie.
    let already_set = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .any(|v| {
            v.to_str()
                .is_ok_and(|s| s.starts_with(&format!("{CSRF_COOKIE}=")))
        });

    if existing.is_none() && !already_set {
        let token = generate_token();
        if let Some(value) = set_cookie_value(&token, state.config.environment.is_production()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

fn is_exempt(method: &Method, path: &str) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS) || path.starts_with("/health")
}

fn check(headers: &HeaderMap) -> Result<(), AppError> {
    let cookie = cookie_value(headers, CSRF_COOKIE);
    let header = headers.get(CSRF_HEADER).and_then(|h| h.to_str().ok());

    match (cookie, header) {
        (Some(cookie), Some(header)) if cookie == header => Ok(()),
        (Some(_), Some(_)) => Err(AppError::forbidden("CSRF token invalid")),
        _ => Err(AppError::forbidden(
            "CSRF token missing, refresh the page and try again",
        )),
    }
}

/// Token verification for state-mutating methods. GET/HEAD/OPTIONS and the
/// health probes are exempt.
pub async fn verify_token(request: Request, next: Next) -> Response {
    if is_exempt(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    match check(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(cookie: Option<&str>, header: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = cookie {
            headers.insert(
                COOKIE,
                format!("{CSRF_COOKIE}={token}; other=1").parse().unwrap(),
            );
        }
        if let Some(token) = header {
            headers.insert(CSRF_HEADER, token.parse().unwrap());
        }
        headers
    }

    #[test]
    fn generated_tokens_are_256_bit_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn matching_cookie_and_header_pass() {
        assert!(check(&headers_with(Some("tok"), Some("tok"))).is_ok());
    }

    #[test]
    fn missing_either_side_is_forbidden() {
        let err = check(&headers_with(Some("tok"), None)).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
        assert!(check(&headers_with(None, Some("tok"))).is_err());
        assert!(check(&headers_with(None, None)).is_err());
    }

    #[test]
    fn mismatch_is_forbidden_with_invalid_message() {
        let err = check(&headers_with(Some("aaa"), Some("bbb"))).unwrap_err();
        assert_eq!(err.message, "CSRF token invalid");
    }

    #[test]
    fn safe_methods_and_health_are_exempt() {
        assert!(is_exempt(&Method::GET, "/work-orders"));
        assert!(is_exempt(&Method::OPTIONS, "/contracts"));
        assert!(is_exempt(&Method::POST, "/health"));
        assert!(!is_exempt(&Method::POST, "/work-orders"));
        assert!(!is_exempt(&Method::DELETE, "/grants/abc"));
    }

    #[test]
    fn cookie_parsing_handles_multiple_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "a=1; csrf-token=xyz; b=2".parse().unwrap());
        assert_eq!(cookie_value(&headers, CSRF_COOKIE), Some("xyz"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn secure_flag_only_in_production() {
        let dev = set_cookie_value("tok", false).unwrap();
        assert!(!dev.to_str().unwrap().contains("Secure"));
        let prod = set_cookie_value("tok", true).unwrap();
        assert!(prod.to_str().unwrap().ends_with("; Secure"));
        assert!(prod.to_str().unwrap().contains("HttpOnly"));
        assert!(prod.to_str().unwrap().contains("SameSite=Strict"));
    }
}
