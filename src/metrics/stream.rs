use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use super::dashboard::{DashboardSnapshot, RefreshStatus};
use crate::handlers::AppError;
use crate::AppState;

/// What the dashboard polls: the latest views plus how fresh they are.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub dashboard: Arc<DashboardSnapshot>,
    pub refresh: RefreshStatus,
}

// ─── GET /api/dashboard ──────────────────────────────────────────
/// Returns a single JSON snapshot; 404 until the first cycle succeeds.

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, AppError> {
    let dashboard = state
        .store
        .snapshot()
        .ok_or_else(|| AppError::NotFound("No metrics batch has been aggregated yet".into()))?;

    Ok(Json(DashboardResponse {
        dashboard,
        refresh: state.store.status(),
    }))
}

// ─── GET /api/dashboard/stream ───────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes the latest `DashboardSnapshot` as JSON on every tick; ticks
/// before the first successful cycle are skipped.

pub async fn dashboard_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(state.stream_interval);

    let stream = IntervalStream::new(interval).filter_map(move |_| {
        let snapshot = state.store.snapshot()?;
        let event = Event::default()
            .event("dashboard")
            .json_data(snapshot.as_ref())
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "failed to encode dashboard event");
                Event::default().comment("encode error")
            });
        Some(Ok(event))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
