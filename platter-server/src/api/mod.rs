//! HTTP API
//!
//! - [`health`] - health checks
//! - [`orders`] - order management under `/api/orders`
//!
//! Every order endpoint answers with the [`shared::ApiResponse`] envelope.

pub mod health;
pub mod orders;

use axum::{Json, Router, http::StatusCode, middleware, response::IntoResponse};
use shared::ApiResponse;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// HTTP access log middleware
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("Not found", Some("No such route".to_string()))),
    )
}

/// Build the router with all routes, layers and state
pub fn build_app(state: ServerState) -> Router {
    health::mark_started();
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(orders::router())
        .fallback(fallback)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
