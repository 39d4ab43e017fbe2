//! HTTP API serving chart data to the dashboard.
//!
//! Endpoints:
//! - `GET /report` - every stored series aligned on one axis
//! - `GET /one?key=NAME` - a single series on its own axis
//! - `GET /list` - names of all stored series
//! - `GET /health` - store and poller status
//!
//! Every other path is served from the static asset directory.

use crate::chart::{self, AlignedChart};
use crate::core::{ReportError, Result, ServerConfig};
use crate::poller::{PollStats, PollStatsSnapshot};
use crate::storage::SharedStore;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// API server state.
#[derive(Clone)]
struct ApiState {
    store: SharedStore,
    stats: Arc<PollStats>,
}

/// Chart payload in the shape the dashboard's line chart consumes.
#[derive(Debug, Serialize)]
pub struct ChartResponse {
    series: Vec<LineSeries>,
    #[serde(rename = "xAxis")]
    x_axis: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LineSeries {
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
    data: Vec<i64>,
}

impl From<AlignedChart> for ChartResponse {
    fn from(chart: AlignedChart) -> Self {
        Self {
            series: chart
                .series
                .into_iter()
                .map(|s| LineSeries {
                    kind: "line",
                    name: s.name,
                    data: s.values,
                })
                .collect(),
            x_axis: chart.labels,
        }
    }
}

/// Series name listing.
#[derive(Debug, Serialize)]
struct KeysResponse {
    keys: Vec<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    series_count: usize,
    poller: PollStatsSnapshot,
}

/// Error response.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

/// Query parameters for a single series.
#[derive(Debug, Deserialize)]
struct OneQuery {
    /// Series name
    #[serde(default)]
    key: String,
}

/// Build the API router.
pub fn router(store: SharedStore, stats: Arc<PollStats>, config: &ServerConfig) -> Router {
    let state = ApiState { store, stats };

    let mut app = Router::new()
        .route("/report", get(report_handler))
        .route("/one", get(one_handler))
        .route("/list", get(list_handler))
        .route("/health", get(health_handler))
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        app = app.layer(ServiceBuilder::new().layer(CorsLayer::permissive()));
    }

    app
}

/// Start the API server and run until `shutdown` resolves.
pub async fn serve<F>(
    store: SharedStore,
    stats: Arc<PollStats>,
    config: &ServerConfig,
    shutdown: F,
) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = router(store, stats, config);
    let addr = SocketAddr::new(config.bind_address, config.port);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        ReportError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to bind to {}: {}", addr, e),
        ))
    })?;
    tracing::info!("Chart API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// GET /report - all series aligned on the longest one
async fn report_handler(State(state): State<ApiState>) -> Response {
    let store = Arc::clone(&state.store);
    match run_blocking(move || chart::align_for_chart(store.as_ref(), &[])).await {
        Ok(chart) => Json(ChartResponse::from(chart)).into_response(),
        Err(e) => error_response("Failed to build report", &e),
    }
}

/// GET /one?key=NAME - a single series
async fn one_handler(State(state): State<ApiState>, Query(params): Query<OneQuery>) -> Response {
    let store = Arc::clone(&state.store);
    let names = vec![params.key];
    match run_blocking(move || chart::align_for_chart(store.as_ref(), &names)).await {
        Ok(chart) => Json(ChartResponse::from(chart)).into_response(),
        Err(e) => error_response("Failed to load series", &e),
    }
}

/// GET /list - stored series names
async fn list_handler(State(state): State<ApiState>) -> Response {
    let store = Arc::clone(&state.store);
    match run_blocking(move || store.list_names()).await {
        Ok(names) => Json(KeysResponse {
            keys: names.into_iter().collect(),
        })
        .into_response(),
        Err(e) => error_response("Failed to list series", &e),
    }
}

/// GET /health - store reachability and poller counters
async fn health_handler(State(state): State<ApiState>) -> Response {
    let store = Arc::clone(&state.store);
    let poller = state.stats.snapshot();

    match run_blocking(move || store.list_names()).await {
        Ok(names) => Json(HealthResponse {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            series_count: names.len(),
            poller,
        })
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: format!("Store unavailable: {}", e),
                code: 503,
            }),
        )
            .into_response(),
    }
}

/// Store calls block on disk IO, keep them off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

fn error_response(context: &str, error: &ReportError) -> Response {
    tracing::error!("{}: {}", context, error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("{}: {}", context, error),
            code: 500,
        }),
    )
        .into_response()
}
