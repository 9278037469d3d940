use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Aggregated views ────────────────────────────────────
        .route("/api/dashboard", get(stream::get_dashboard))
        .route("/api/dashboard/stream", get(stream::dashboard_stream))
        .route("/api/records", get(handlers::refresh::latest_records))
        // ── Refresh control ─────────────────────────────────────
        .route("/api/refresh", post(handlers::refresh::refresh_now))
        .route("/api/refresh/start", post(handlers::refresh::start_refresh))
        .route("/api/refresh/stop", post(handlers::refresh::stop_refresh))
        .route("/api/refresh/status", get(handlers::refresh::refresh_status))
        // ── Mock data source ────────────────────────────────────
        .route("/metrics", get(handlers::mock_source::mock_metrics))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
