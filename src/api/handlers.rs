//! Request Handlers
//!
//! Thin adapters from HTTP to `GameEngine` commands. Each handler performs one
//! engine call; the engine serializes them against the round ticker.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::games::{
    types::{BetPlacement, CashoutReceipt, Player, RoundSnapshot},
    GameEngine,
};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub engine: Arc<GameEngine>,
    pub version: String,
}

impl AppState {
    pub fn new(engine: Arc<GameEngine>) -> Self {
        Self {
            engine,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

fn require(request_id: &RequestId, field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(
            request_id.0.clone(),
            format!("{} is required", field),
        ));
    }
    Ok(())
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// GET /api/game/status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<RoundSnapshot> {
    Json(state.engine.snapshot())
}

/// POST /api/game/join
pub async fn join_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<JoinRequest>,
) -> Result<Json<Player>, ApiError> {
    require(&request_id, "player_id", &body.player_id)?;
    require(&request_id, "name", &body.name)?;

    state
        .engine
        .add_player(&body.player_id, &body.name)
        .map(Json)
        .map_err(|e| ApiError::game(request_id.0, e))
}

/// POST /api/game/bet
pub async fn bet_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<BetRequest>,
) -> Result<Json<BetPlacement>, ApiError> {
    require(&request_id, "player_id", &body.player_id)?;

    state
        .engine
        .place_bet(&body.player_id, body.amount)
        .map(Json)
        .map_err(|e| ApiError::game(request_id.0, e))
}

/// POST /api/game/cashout
pub async fn cashout_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CashoutRequest>,
) -> Result<Json<CashoutReceipt>, ApiError> {
    require(&request_id, "player_id", &body.player_id)?;

    state
        .engine
        .cashout(&body.player_id)
        .map(Json)
        .map_err(|e| ApiError::game(request_id.0, e))
}

/// POST /api/game/load-balance (admin)
pub async fn load_balance_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoadBalanceRequest>,
) -> Result<Json<Player>, ApiError> {
    require(&request_id, "player_name", &body.player_name)?;

    state
        .engine
        .load_balance_by_name(&body.player_name, body.amount)
        .map(Json)
        .map_err(|e| ApiError::game(request_id.0, e))
}

/// GET /api/game/players/:player_id
pub async fn player_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Result<Json<Player>, ApiError> {
    state
        .engine
        .lookup_player(&player_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(request_id.0, format!("Player {} not found", player_id)))
}

/// GET /api/game/players/by-name/:name
pub async fn player_by_name_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Player>, ApiError> {
    state
        .engine
        .lookup_player_by_name(&name)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(request_id.0, format!("Player {} not found", name)))
}

/// GET /api/game/active-bets
pub async fn active_bets_handler(State(state): State<Arc<AppState>>) -> Json<ActiveBetsResponse> {
    let round = state.engine.snapshot().round;
    Json(ActiveBetsResponse {
        round,
        bets: state.engine.active_bets(),
    })
}

/// GET /api/game/history
pub async fn history_handler(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    Json(state.engine.crash_history().into())
}

/// GET /metrics
pub async fn metrics_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let body = state
        .engine
        .metrics()
        .render()
        .map_err(|e| ApiError::internal_error(request_id.0, format!("Failed to render metrics: {}", e)))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response())
}
