use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::dashboard::RefreshStatus;
use crate::metrics::{DashboardSnapshot, MetricRecord};
use crate::AppState;

use super::AppError;

// ─── Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerStatus {
    pub running: bool,
    pub interval_ms: u64,
    pub message: String,
    pub refresh: RefreshStatus,
}

async fn controller_status(state: &AppState, message: impl Into<String>) -> ControllerStatus {
    ControllerStatus {
        running: state.refresher.is_running().await,
        interval_ms: state.refresher.interval().as_millis() as u64,
        message: message.into(),
        refresh: state.store.status(),
    }
}

// ─── POST /api/refresh ───────────────────────────────────────────
/// Run one cycle right now and return the fresh snapshot.

pub async fn refresh_now(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Arc<DashboardSnapshot>>, AppError> {
    Ok(Json(state.refresher.refresh_once().await?))
}

// ─── POST /api/refresh/start ─────────────────────────────────────

pub async fn start_refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ControllerStatus>, AppError> {
    state.refresher.start().await?;
    Ok(Json(controller_status(&state, "Refresh started").await))
}

// ─── POST /api/refresh/stop ──────────────────────────────────────

pub async fn stop_refresh(State(state): State<Arc<AppState>>) -> Json<ControllerStatus> {
    let message = if state.refresher.stop().await {
        "Refresh stopped"
    } else {
        "Refresh was not running"
    };
    Json(controller_status(&state, message).await)
}

// ─── GET /api/refresh/status ─────────────────────────────────────

pub async fn refresh_status(State(state): State<Arc<AppState>>) -> Json<ControllerStatus> {
    let running = state.refresher.is_running().await;
    Json(controller_status(&state, if running { "Polling" } else { "Idle" }).await)
}

// ─── GET /api/records ────────────────────────────────────────────
/// The raw batch behind the current dashboard.

pub async fn latest_records(State(state): State<Arc<AppState>>) -> Json<Arc<Vec<MetricRecord>>> {
    Json(state.store.records())
}
