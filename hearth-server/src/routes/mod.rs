use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use shared::AppError;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::{Config, ServerState};

pub mod logging;

/// Upper bound on concurrently processed requests. Excess requests
/// queue rather than fail.
const MAX_IN_FLIGHT: usize = 512;

/// Request bodies are JSON only. 1 MB leaves generous headroom.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Order API - authentication required
        .merge(crate::api::orders::router())
        // Sub-order API - chef or admin
        .merge(crate::api::sub_orders::router())
        // Cart API - authentication required
        .merge(crate::api::carts::router())
        // Meal API - public reads
        .merge(crate::api::meals::router())
        // Health API - public route
        .merge(crate::api::health::router())
}

/// Build a fully configured application with all middleware and state
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    let deadline = Duration::from_secs(state.config.request_timeout_secs);
    build_router()
        // ========== Tower HTTP Middleware ==========
        // Deadline - innermost, slow requests become TIMEOUT envelopes
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .concurrency_limit(MAX_IN_FLIGHT)
                .timeout(deadline),
        )
        // Body size cap
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // CORS - Handle cross-origin requests
        .layer(cors_layer(&state.config))
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Request logging
        .layer(axum_middleware::from_fn(logging::logging_middleware))
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // ========== Application Middleware ==========
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // JWT authentication - outermost, injects CurrentUser before routes
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
}

/// Locked-down CORS when an origin is configured, permissive otherwise.
fn cors_layer(config: &Config) -> CorsLayer {
    match config
        .cors_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}

async fn handle_middleware_error(err: tower::BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::timeout("request exceeded the processing deadline")
    } else {
        AppError::internal(err.to_string())
    }
}
