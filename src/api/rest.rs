// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Reads take a read guard on the
// coordinator directly; every mutation is handed to the update queue and the
// handler waits for its outcome.
//
// Chart errors map onto status codes:
//   MalformedSeries -> 422, InvalidConfig -> 400, StaleUpdate -> 409.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::chart::CrosshairSample;
use crate::error::ChartError;
use crate::indicators::{IndicatorConfig, IndicatorId};
use crate::market_data::{normalize_time, RawBar, RawTime, RawVolume};
use crate::update_queue::{ChartCommand, CommandOutcome, RawLiveUpdate};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        // ── Reads ───────────────────────────────────────────────────
        .route("/api/v1/chart", get(chart))
        .route("/api/v1/summary", get(summary))
        .route("/api/v1/crosshair", get(crosshair))
        // ── Queued mutations ────────────────────────────────────────
        .route("/api/v1/bars", post(replace_bars))
        .route("/api/v1/bars/live", post(live_bar))
        .route("/api/v1/indicators", post(enable_indicator))
        .route("/api/v1/indicators/:id", delete(disable_indicator))
        // ── WebSocket (handled separately in ws module but mounted here) ─
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

pub enum ApiError {
    Chart(ChartError),
    /// The update queue is gone; the service is shutting down.
    Unavailable(anyhow::Error),
}

impl From<ChartError> for ApiError {
    fn from(e: ChartError) -> Self {
        Self::Chart(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Unavailable(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            Self::Chart(e) => {
                let (status, error) = match &e {
                    ChartError::MalformedSeries(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "malformed_series")
                    }
                    ChartError::InvalidConfig(_) => (StatusCode::BAD_REQUEST, "invalid_config"),
                    ChartError::StaleUpdate { .. } => (StatusCode::CONFLICT, "stale_update"),
                };
                (status, error, e.to_string())
            }
            Self::Unavailable(e) => {
                warn!(error = %e, "update queue unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", format!("{e:#}"))
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

async fn submit(state: &AppState, command: ChartCommand) -> Result<Json<CommandOutcome>, ApiError> {
    let outcome = state.updates.submit(command).await??;
    Ok(Json(outcome))
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    generation: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        generation: state.coordinator.read().generation(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Reads
// =============================================================================

async fn chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

async fn summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.summary())
}

#[derive(Deserialize)]
pub struct CrosshairQuery {
    time: Option<String>,
}

/// A crosshair sample together with its display strings.
#[derive(Serialize)]
pub struct CrosshairResponse {
    #[serde(flatten)]
    pub sample: CrosshairSample,
    pub legend: BTreeMap<String, String>,
}

impl CrosshairResponse {
    pub fn new(sample: CrosshairSample, decimals: usize) -> Self {
        let legend = sample.legend(decimals);
        Self { sample, legend }
    }
}

/// Interpret a query-string time: digits are epoch seconds, anything else a
/// calendar date. Blank means the pointer is off the surface.
pub fn parse_time_param(text: &str) -> Option<RawTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<i64>() {
        Ok(secs) => Some(RawTime::Epoch(secs)),
        Err(_) => Some(RawTime::Date(text.to_string())),
    }
}

async fn crosshair(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CrosshairQuery>,
) -> Result<Json<CrosshairResponse>, ApiError> {
    let time = match query.time.as_deref().and_then(parse_time_param) {
        Some(raw) => Some(normalize_time(&raw, state.config.granularity)?),
        None => None,
    };
    let sample = state.crosshair(time);
    Ok(Json(CrosshairResponse::new(sample, state.config.crosshair_decimals)))
}

// =============================================================================
// Queued mutations
// =============================================================================

#[derive(Deserialize)]
pub struct ReplaceRequest {
    bars: Vec<RawBar>,
    #[serde(default)]
    volume: Vec<RawVolume>,
}

async fn replace_bars(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReplaceRequest>,
) -> Result<Json<CommandOutcome>, ApiError> {
    info!(bars = body.bars.len(), volume = body.volume.len(), "range replace requested");
    submit(
        &state,
        ChartCommand::ReplaceRange {
            bars: body.bars,
            volume: body.volume,
        },
    )
    .await
}

async fn live_bar(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RawLiveUpdate>,
) -> Result<Json<CommandOutcome>, ApiError> {
    submit(&state, ChartCommand::Live(body)).await
}

async fn enable_indicator(
    State(state): State<Arc<AppState>>,
    Json(config): Json<IndicatorConfig>,
) -> Result<Json<CommandOutcome>, ApiError> {
    info!(indicator = %config.id(), "indicator enable requested");
    submit(&state, ChartCommand::Enable(config)).await
}

async fn disable_indicator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CommandOutcome>, ApiError> {
    let id: IndicatorId = id.parse()?;
    info!(indicator = %id, "indicator disable requested");
    submit(&state, ChartCommand::Disable(id)).await
}
