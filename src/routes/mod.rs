use axum::http::{header, HeaderValue};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{checkin_stats, health_check, verify_qr, verify_qr_preflight};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/verify-qr", post(verify_qr).options(verify_qr_preflight))
        .route("/events/:event_id/checkin-stats", get(checkin_stats))
        .with_state(state)
        // Added innermost so preflights answered by CORS still pass through
        // the header layers below.
        .layer(create_cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(create_security_headers_layer(config.production))
        .layer(TraceLayer::new_for_http())
}
