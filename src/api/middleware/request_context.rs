//! Correlation identity for every inbound request.

use std::time::Instant;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request correlation context. Created before any other stage runs,
/// stable for the lifetime of the request, echoed on the response.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub started_at: Instant,
}

impl RequestContext {
    fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            request_id,
            started_at: Instant::now(),
        }
    }
}

/// Outermost middleware: adopt or mint the correlation id, stash the
/// context for downstream stages, and set the response header on the way
/// out. This stage cannot reject a request.
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let context = RequestContext::from_headers(request.headers());
    let request_id = context.request_id.clone();
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn adopts_inbound_header_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, "req-test-123".parse().unwrap());
        let ctx = RequestContext::from_headers(&headers);
        assert_eq!(ctx.request_id, "req-test-123");
    }

    #[test]
    fn generates_id_when_header_absent_or_empty() {
        let ctx = RequestContext::from_headers(&HeaderMap::new());
        assert!(!ctx.request_id.is_empty());

        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, "".parse().unwrap());
        let ctx = RequestContext::from_headers(&headers);
        assert!(!ctx.request_id.is_empty());
        assert!(Uuid::parse_str(&ctx.request_id).is_ok());
    }
}
