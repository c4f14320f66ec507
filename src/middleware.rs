//! Response middleware.
//!
//! `response_headers_layer` stamps the fixed CORS and Permissions-Policy
//! headers onto every response the static pipeline produces, including
//! errors. `request_id_layer` wraps each request in a tracing span with a
//! UUID v4 request id so all logs for a request can be correlated.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::header::{
    HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ALLOW_HEADERS, ALLOW_METHODS, ALLOW_ORIGIN, PERMISSIONS_POLICY};

/// `Permissions-Policy` is not among the `http` crate's well-known names.
pub const PERMISSIONS_POLICY_HEADER: HeaderName = HeaderName::from_static("permissions-policy");

/// Headers added to every response.
#[derive(Debug, Clone)]
pub struct ResponseHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        Self {
            headers: vec![
                (
                    ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static(ALLOW_ORIGIN),
                ),
                (
                    ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(ALLOW_METHODS),
                ),
                (
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOW_HEADERS),
                ),
                (
                    PERMISSIONS_POLICY_HEADER,
                    HeaderValue::from_static(PERMISSIONS_POLICY),
                ),
            ],
        }
    }
}

impl ResponseHeaders {
    pub fn iter(&self) -> impl Iterator<Item = &(HeaderName, HeaderValue)> {
        self.headers.iter()
    }

    /// Insert every header into `response`, replacing any value already set.
    pub fn apply(&self, response: &mut Response) {
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

/// Middleware that finalizes each response with the configured headers.
pub async fn response_headers_layer(
    State(headers): State<Arc<ResponseHeaders>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    headers.apply(&mut response);
    response
}

/// Middleware that generates a request ID and creates a request span.
///
/// This should be the outermost middleware layer so the span wraps
/// all request processing, including other middleware and handlers.
pub async fn request_id_layer(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();

    async move {
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms,
            "Request completed"
        );

        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route(
                "/preset",
                get(|| async {
                    (
                        [(ACCESS_CONTROL_ALLOW_ORIGIN, "https://example.com")],
                        "preset",
                    )
                }),
            )
            .layer(middleware::from_fn_with_state(
                Arc::new(ResponseHeaders::default()),
                response_headers_layer,
            ))
            .layer(middleware::from_fn(request_id_layer))
    }

    fn assert_fixed_headers(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers["permissions-policy"], "camera=(*)");
    }

    #[test]
    fn test_default_set_has_four_headers() {
        assert_eq!(ResponseHeaders::default().iter().count(), 4);
    }

    #[tokio::test]
    async fn test_headers_on_success() {
        let response = app()
            .oneshot(http::Request::get("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_fixed_headers(&response);
    }

    #[tokio::test]
    async fn test_headers_on_unmatched_route() {
        let response = app()
            .oneshot(http::Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_fixed_headers(&response);
    }

    #[tokio::test]
    async fn test_headers_override_handler_values() {
        let response = app()
            .oneshot(http::Request::get("/preset").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_fixed_headers(&response);
        assert_eq!(
            response
                .headers()
                .get_all(ACCESS_CONTROL_ALLOW_ORIGIN)
                .iter()
                .count(),
            1
        );
    }
}
