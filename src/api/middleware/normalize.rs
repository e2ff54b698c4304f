//! Key-casing normalization.
//!
//! Clients send either snake_case or camelCase; everything downstream of
//! this stage (validation rule sets, handlers) sees camelCase only. Runs
//! once, before any validation or handler code.

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::domain::errors::AppError;

/// Upper bound for buffered JSON bodies (2 MiB). Larger bodies are
/// rejected with 413 before any handler runs.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// `snake_case` → `camelCase` for one key: `_` followed by a lowercase
/// letter collapses into the uppercase letter.
pub fn camelize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_' {
            match chars.peek() {
                Some(next) if next.is_ascii_lowercase() => {
                    out.extend(chars.next().into_iter().flat_map(|c| c.to_uppercase()));
                }
                _ => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Recursively rewrite every object key; arrays map element-wise; scalar
/// leaves and null pass through unchanged.
pub fn camelize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (camelize_key(&k), camelize_value(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(camelize_value).collect()),
        other => other,
    }
}

/// Buffer and rewrite a JSON request body; rewrite query-string keys the
/// same way. Malformed JSON passes through untouched so the body extractor
/// reports the syntax error; a body over the buffering cap is rejected
/// with 413.
pub async fn normalize_request(request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    if let Some(query) = parts.uri.query() {
        if query.contains('_') {
            if let Some(uri) = rewrite_query(&parts.uri, query) {
                parts.uri = uri;
            }
        }
    }

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return AppError::from_status(StatusCode::PAYLOAD_TOO_LARGE).into_response();
        }
    };

    let body = if bytes.is_empty() {
        Body::from(bytes)
    } else {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(parsed) => {
                let normalized = camelize_value(parsed);
                match serde_json::to_vec(&normalized) {
                    Ok(encoded) => Body::from(encoded),
                    Err(_) => Body::from(bytes),
                }
            }
            Err(_) => Body::from(bytes),
        }
    };

    // Content-Length no longer matches the rewritten body.
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);

    next.run(Request::from_parts(parts, body)).await
}

fn rewrite_query(uri: &Uri, query: &str) -> Option<Uri> {
    let rewritten: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => format!("{}={}", camelize_key(key), value),
            None => camelize_key(pair),
        })
        .collect();

    let path_and_query = format!("{}?{}", uri.path(), rewritten.join("&"));
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = path_and_query.parse().ok();
    Uri::from_parts(parts).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn converts_keys_at_arbitrary_depth() {
        let input = json!({
            "first_name": "Ada",
            "address_info": {"zip_code": "12345", "street_lines": ["a", "b"]},
            "tags": [{"tag_name": "x"}],
        });
        let expected = json!({
            "firstName": "Ada",
            "addressInfo": {"zipCode": "12345", "streetLines": ["a", "b"]},
            "tags": [{"tagName": "x"}],
        });
        assert_eq!(camelize_value(input), expected);
    }

    #[test]
    fn leaves_values_and_scalars_untouched() {
        assert_eq!(camelize_value(json!(null)), json!(null));
        assert_eq!(camelize_value(json!("snake_case_value")), json!("snake_case_value"));
        assert_eq!(camelize_value(json!(42)), json!(42));
    }

    #[test]
    fn underscore_followed_by_non_lowercase_is_preserved() {
        assert_eq!(camelize_key("zip_code"), "zipCode");
        assert_eq!(camelize_key("already_Camel"), "already_Camel");
        assert_eq!(camelize_key("trailing_"), "trailing_");
        assert_eq!(camelize_key("_private"), "Private");
        assert_eq!(camelize_key("a_b_c"), "aBC");
    }

    #[test]
    fn rewrites_query_keys_only() {
        let uri: Uri = "/work-orders?page_size=10&sort_by=due_date".parse().unwrap();
        let rewritten = rewrite_query(&uri, uri.query().unwrap()).unwrap();
        assert_eq!(rewritten.query().unwrap(), "pageSize=10&sortBy=due_date");
    }

    proptest! {
        #[test]
        fn camelized_objects_preserve_value_multiset(
            entries in proptest::collection::btree_map("[a-z]{1,8}(_[a-z]{1,8}){0,3}", 0i64..1000, 0..8)
        ) {
            let before: Vec<i64> = entries.values().copied().collect();
            let input = Value::Object(
                entries.iter().map(|(k, v)| (k.clone(), json!(v))).collect(),
            );
            let output = camelize_value(input);
            let mut after: Vec<i64> = output
                .as_object()
                .unwrap()
                .values()
                .map(|v| v.as_i64().unwrap())
                .collect();
            after.sort_unstable();
            let mut before_sorted = before;
            before_sorted.sort_unstable();
            prop_assert_eq!(before_sorted, after);
        }
    }
}
