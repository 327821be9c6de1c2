//! API Middleware
//!
//! Request context and logging middleware.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::domain::OperationContext;

/// Header carrying a caller-supplied correlation ID
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Header set by the request-id layer
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation ID supplied by the caller: explicit correlation header first,
/// then the request ID.
pub fn correlation_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    [CORRELATION_ID_HEADER, REQUEST_ID_HEADER]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .find_map(|s| Uuid::parse_str(s).ok())
}

/// Build the context for a request, generating a correlation ID when the
/// caller did not supply one.
pub fn context_from_headers(headers: &HeaderMap) -> OperationContext {
    let mut context = match correlation_id_from_headers(headers) {
        Some(correlation_id) => OperationContext::new().with_correlation_id(correlation_id),
        None => OperationContext::new(),
    };
    context.ensure_correlation_id();
    context
}

/// Attach an [`OperationContext`] to every request
pub async fn context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let context = context_from_headers(request.headers());
    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "proxy-authorization"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());

    let correlation_id = request
        .extensions()
        .get::<OperationContext>()
        .and_then(|ctx| ctx.correlation_id);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        correlation_id = ?correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer secret".parse().unwrap());
        headers.insert("x-correlation-id", "abc".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let auth = masked.iter().find(|(k, _)| k == "authorization");
        let content_type = masked.iter().find(|(k, _)| k == "content-type");
        let correlation = masked.iter().find(|(k, _)| k == "x-correlation-id");

        assert_eq!(auth.unwrap().1, "[REDACTED]");
        assert_eq!(content_type.unwrap().1, "application/json");
        assert_eq!(correlation.unwrap().1, "abc");
    }

    #[test]
    fn test_correlation_id_prefers_explicit_header() {
        let correlation = Uuid::new_v4();
        let request_id = Uuid::new_v4();

        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, request_id.to_string().parse().unwrap());
        headers.insert(CORRELATION_ID_HEADER, correlation.to_string().parse().unwrap());

        assert_eq!(correlation_id_from_headers(&headers), Some(correlation));
    }

    #[test]
    fn test_correlation_id_falls_back_to_request_id() {
        let request_id = Uuid::new_v4();

        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_ID_HEADER, "not-a-uuid".parse().unwrap());
        headers.insert(REQUEST_ID_HEADER, request_id.to_string().parse().unwrap());

        assert_eq!(correlation_id_from_headers(&headers), Some(request_id));
    }

    #[test]
    fn test_correlation_id_generated_when_absent() {
        let headers = HeaderMap::new();
        assert_eq!(correlation_id_from_headers(&headers), None);

        let a = context_from_headers(&headers).correlation_id;
        let b = context_from_headers(&headers).correlation_id;
        assert!(a.is_some());
        assert_ne!(a, b);
    }

    #[test]
    fn test_context_keeps_supplied_correlation_id() {
        let correlation = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_ID_HEADER, correlation.to_string().parse().unwrap());

        assert_eq!(context_from_headers(&headers).correlation_id, Some(correlation));
    }
}
