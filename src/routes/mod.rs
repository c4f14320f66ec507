//! Request pipeline.
//!
//! There are no application routes: every request goes to the static file
//! service. The response-header middleware wraps that service so the CORS and
//! Permissions-Policy headers land on every response, errors included.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

use axum::{middleware, Router};

use crate::http::static_files::create_static_service;
use crate::middleware::{request_id_layer, response_headers_layer};
use crate::state::AppState;

/// Creates the Axum router serving the configured document root.
pub fn create_router(state: AppState) -> Router {
    let static_service = create_static_service(&state.config.serve.root, state.tera.clone());

    Router::new()
        .fallback_service(static_service)
        // Header layer - runs after the file service has produced its response
        .layer(middleware::from_fn_with_state(
            state.headers.clone(),
            response_headers_layer,
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
