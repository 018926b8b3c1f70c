//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug_span, warn, Span};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let body_limit = state.config.body_limit();

    let api = Router::new()
        .route("/upload", post(handlers::upload))
        .route("/access/{doc_id}", post(handlers::access))
        .route("/download/{doc_id}", get(handlers::download))
        .route("/documents/{doc_id}", delete(handlers::delete_document))
        .route("/health", get(handlers::health_check));

    Router::new()
        .nest("/api", api)
        // Apply middleware
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Span for one request. Passcodes travel in the query string, so only the path is recorded.
fn request_span(request: &Request) -> Span {
    debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// CORS for the configured origins; `*` allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}
