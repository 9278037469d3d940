use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

mod config;
mod error;
mod handlers;
mod logger;
mod metrics;
mod middleware;
mod mock_data;
mod refresh;
mod server;
mod source;

use config::DashboardArgs;
use error::StartupError;
use metrics::DashboardStore;
use refresh::RefreshController;
use source::{DataSource, HttpSource, MockSource};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Latest aggregated views — the refresh controller writes, handlers read.
    pub store: Arc<DashboardStore>,

    /// Owns the polling task; started and stopped over the API.
    pub refresher: RefreshController,

    /// Tick of the SSE dashboard stream.
    pub stream_interval: Duration,
}

#[tokio::main]
async fn main() {
    let args = DashboardArgs::parse();
    logger::init_logging(args.verbose);

    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "request dashboard failed");
        std::process::exit(1);
    }
}

async fn run(args: DashboardArgs) -> Result<(), StartupError> {
    // ── 1. Pick the data source ──────────────────────────────────
    let source: Arc<dyn DataSource> = match &args.source_url {
        Some(url) => Arc::new(HttpSource::new(url.clone(), args.request_timeout())?),
        None => Arc::new(MockSource::new(args.mock_seed, args.mock_count)),
    };
    tracing::info!(source = %source.describe(), "metrics source configured");

    // ── 2. Build shared state ────────────────────────────────────
    let store = Arc::new(DashboardStore::new());
    let state = Arc::new(AppState {
        refresher: RefreshController::new(source, store.clone(), args.refresh_interval()),
        store,
        stream_interval: args.stream_interval(),
    });

    if !args.no_autostart {
        // Fresh controller, cannot already be running
        if let Err(err) = state.refresher.start().await {
            tracing::warn!(error = %err, "refresh controller did not start");
        }
    }

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state.clone());

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&args.listen)
        .await
        .map_err(|source| StartupError::Bind {
            addr: args.listen.clone(),
            source,
        })?;

    tracing::info!(listen = %args.listen, "dashboard API listening");
    tracing::info!("  Dashboard JSON → /api/dashboard");
    tracing::info!("  Dashboard SSE  → /api/dashboard/stream");
    tracing::info!("  Mock source    → /metrics");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve);

    state.refresher.stop().await;
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
