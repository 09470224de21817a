use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analyzer::{analyze_rolling_average, RollingSeries};
use crate::api::health::{HealthSnapshot, HealthState};
use crate::api::latency::LatencyStats;
use crate::bot::Dispatcher;
use crate::config::{
    DEFAULT_DRAWS_COUNT, DEFAULT_FILTER_COUNT, DEFAULT_TREND_COUNT, MAX_DRAW_COUNT,
};
use crate::draws::DrawService;
use crate::error::AppError;
use crate::types::{FilterResult, NormalizedDraw, Update};

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct ApiState {
    pub draws: DrawService,
    pub dispatcher: Arc<Dispatcher>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
    pub webhook_secret: Option<String>,
}

pub fn router(state: ApiState, webhook_path: &str) -> Router {
    Router::new()
        .route("/", get(root))
        .route(webhook_path, post(webhook))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .route("/draws", get(get_draws))
        .route("/draws/filter/:code", get(get_filtered_draws))
        .route("/draws/rolling", get(get_rolling_average))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CountQuery {
    pub count: Option<usize>,
}

#[derive(Deserialize)]
pub struct RollingQuery {
    pub count: Option<usize>,
    pub window: Option<usize>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn root() -> &'static str {
    "Hello, this is the IRCC Draws Bot server."
}

/// Acknowledge immediately; the update is handled on its own task.
/// The secret token is checked before the body is parsed.
async fn webhook(State(state): State<ApiState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected) {
            warn!("[WEBHOOK] rejected request with bad secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            warn!("[WEBHOOK] malformed update body: {e}");
            return StatusCode::BAD_REQUEST;
        }
    };

    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move { dispatcher.handle_update(update).await });
    StatusCode::OK
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthSnapshot> {
    Json(state.health.snapshot())
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let percentiles = state.latency.percentiles_ms();
    Json(LatencyResponse {
        samples: state.latency.len(),
        p50_ms: percentiles.map(|p| p.0),
        p95_ms: percentiles.map(|p| p.1),
        p99_ms: percentiles.map(|p| p.2),
    })
}

async fn get_draws(
    State(state): State<ApiState>,
    Query(params): Query<CountQuery>,
) -> Result<Json<Vec<NormalizedDraw>>, AppError> {
    let count = clamp_count(params.count, DEFAULT_DRAWS_COUNT);
    Ok(Json(state.draws.fetch_draws(count).await?))
}

async fn get_filtered_draws(
    State(state): State<ApiState>,
    Path(code): Path<String>,
    Query(params): Query<CountQuery>,
) -> Result<Json<FilterResult>, AppError> {
    let count = clamp_count(params.count, DEFAULT_FILTER_COUNT);
    Ok(Json(state.draws.filter_draws(&code, count).await?))
}

async fn get_rolling_average(
    State(state): State<ApiState>,
    Query(params): Query<RollingQuery>,
) -> Result<Json<RollingSeries>, AppError> {
    let count = clamp_count(params.count, DEFAULT_TREND_COUNT);
    let draws = state.draws.fetch_draws(count).await?;
    Ok(Json(analyze_rolling_average(&draws, params.window)))
}

fn clamp_count(count: Option<usize>, default: usize) -> usize {
    count.unwrap_or(default).clamp(1, MAX_DRAW_COUNT)
}
