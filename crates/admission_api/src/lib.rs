//! HTTP surface of the admission backend.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderName, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use admission_service::AdmissionService;

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;

/// Header carrying the client's retry key for step uploads.
pub const IDEMPOTENCY_KEY: &str = "idempotency-key";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AdmissionService>,
}

/// Full router with body limit, request tracing and CORS.
pub fn router(service: Arc<AdmissionService>, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(IDEMPOTENCY_KEY)])
        .max_age(Duration::from_secs(60 * 60));

    routes::app_router(AppState { service })
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
