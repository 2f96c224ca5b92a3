use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// HTTP header name for trace ID
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// Per-request correlation id, stored in request extensions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceId(pub Uuid);

/// Run each request inside an `http_request` span tagged with a trace id.
///
/// A well-formed UUID supplied by the caller in `X-Trace-Id` is reused so
/// ids can be followed through a proxy; otherwise a fresh v4 id is minted.
/// The id is echoed in the response header. It is absent from
/// response bodies.
pub async fn trace_id_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = incoming_trace_id(request.headers()).unwrap_or_else(Uuid::new_v4);

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %request.method(),
        uri = %request.uri(),
    );

    request.extensions_mut().insert(TraceId(trace_id));

    let mut response = async move {
        let response = next.run(request).await;
        tracing::info!(status = %response.status(), "Request completed");
        response
    }
    .instrument(span)
    .await;

    if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }

    response
}

fn incoming_trace_id(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(TRACE_ID_HEADER)?.to_str().ok()?;
    Uuid::parse_str(value.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        response::IntoResponse,
        routing::get,
        Extension, Router,
    };
    use tower::util::ServiceExt;

    async fn echo_trace_id(Extension(trace_id): Extension<TraceId>) -> impl IntoResponse {
        (StatusCode::OK, trace_id.0.to_string())
    }

    fn app() -> Router {
        Router::new()
            .route("/test", get(echo_trace_id))
            .layer(middleware::from_fn(trace_id_middleware))
    }

    fn header_id(response: &Response) -> String {
        response
            .headers()
            .get(TRACE_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_trace_id_generated_and_visible_to_handler() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        let from_header = header_id(&response);
        assert!(Uuid::parse_str(&from_header).is_ok());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(from_header, String::from_utf8(body.to_vec()).unwrap());
    }

    #[tokio::test]
    async fn test_trace_id_unique_per_request() {
        let first = app()
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let second = app()
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_ne!(header_id(&first), header_id(&second));
    }

    #[tokio::test]
    async fn test_caller_trace_id_is_reused() {
        let supplied = Uuid::new_v4().to_string();
        let request = Request::builder()
            .uri("/test")
            .header(TRACE_ID_HEADER, &supplied)
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(header_id(&response), supplied);
    }

    #[tokio::test]
    async fn test_malformed_caller_trace_id_is_replaced() {
        let request = Request::builder()
            .uri("/test")
            .header(TRACE_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let id = header_id(&response);
        assert_ne!(id, "not-a-uuid");
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
