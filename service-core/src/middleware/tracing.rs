use axum::http::{HeaderValue, Request};
use axum::{body::Body, extract, middleware::Next, response::Response};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Propagates the caller's `x-request-id` or assigns a fresh one, on both the
/// request (for handlers and spans) and the response.
pub async fn request_id_middleware(mut req: extract::Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        req.headers_mut()
            .insert(REQUEST_ID_HEADER, header_value.clone());

        let mut response = next.run(req).await;
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
        return response;
    }

    next.run(req).await
}

/// Request id of an incoming request, `-` when absent.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RequestSpan;

impl MakeSpan<Body> for RequestSpan {
    fn make_span(&mut self, request: &Request<Body>) -> Span {
        tracing::info_span!(
            "http_request",
            request_id = %request_id(request),
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
        )
    }
}

/// `TraceLayer` whose spans carry the request id. Layer it inside
/// `request_id_middleware` so the id is already set.
pub fn http_trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
    TraceLayer::new_for_http().make_span_with(RequestSpan)
}
