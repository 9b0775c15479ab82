//! Route Definitions

use super::{handlers::*, websocket::websocket_handler};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Round state
        .route("/api/game/status", get(status_handler))
        .route("/api/game/active-bets", get(active_bets_handler))
        .route("/api/game/history", get(history_handler))
        // Player commands
        .route("/api/game/join", post(join_handler))
        .route("/api/game/bet", post(bet_handler))
        .route("/api/game/cashout", post(cashout_handler))
        .route("/api/game/load-balance", post(load_balance_handler))
        .route("/api/game/players/:player_id", get(player_handler))
        .route("/api/game/players/by-name/:name", get(player_by_name_handler))
        // Real-time updates
        .route("/ws", get(websocket_handler))
        // Metrics endpoint for Prometheus
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
