//! WebSocket Support for Real-time Round Events
//!
//! Each client receives the current round snapshot on connect, followed by
//! every `RoundEvent` the engine publishes (launch, crash with settlement,
//! next round, periodic state).

use super::handlers::AppState;
use crate::games::RoundEvent;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

fn encode(event: &RoundEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            error!("Failed to serialize event: {}", e);
            None
        }
    }
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    let client_id = Uuid::new_v4().to_string();
    info!("🔌 WebSocket client {} connected", client_id);

    let (mut sender, mut receiver) = socket.split();
    // Subscribe before the snapshot so no transition falls in between
    let mut rx = state.engine.subscribe();

    let welcome = RoundEvent::State {
        snapshot: state.engine.snapshot(),
    };
    if let Some(message) = encode(&welcome) {
        if let Err(e) = sender.send(message).await {
            warn!("Failed to send snapshot to client {}: {}", client_id, e);
            return;
        }
    }

    let client_for_receive = client_id.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    debug!("Client {} requested close", client_for_receive);
                    break;
                }
                Ok(Message::Text(text)) => {
                    debug!("Ignoring message from client {}: {}", client_for_receive, text);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket error from client {}: {}", client_for_receive, e);
                    break;
                }
            }
        }
    });

    let client_for_send = client_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Client {} lagged, skipped {} events", client_for_send, skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let Some(message) = encode(&event) else {
                continue;
            };
            if sender.send(message).await.is_err() {
                debug!("Client {} disconnected", client_for_send);
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut receive_task => send_task.abort(),
        _ = &mut send_task => receive_task.abort(),
    }

    info!("🔌 WebSocket client {} disconnected", client_id);
}
