pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use ulid::Ulid;

use crate::protocol::{ClientMessage, PollView, ServerMessage};
use crate::state::AppState;
use crate::types::VoterId;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Voter id from a previous visit; a fresh one is minted when absent.
    /// Resuming keeps the voter's one-vote identity across reconnects.
    pub voter: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request: voter={:?}", params.voter);

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let voter_id: VoterId = match params.voter {
        Some(id) if !id.trim().is_empty() => id,
        _ => Ulid::new().to_string(),
    };
    let display_name = petname::petname(2, "-").unwrap_or_else(|| {
        let prefix: String = voter_id.chars().take(6).collect();
        format!("voter-{}", prefix)
    });

    tracing::info!("WebSocket connected: voter {} ({})", voter_id, display_name);

    // Register the direct line for private acks. A reconnect replaces
    // the previous entry.
    let (direct_tx, mut direct_rx) = tokio::sync::mpsc::unbounded_channel();
    state
        .direct
        .write()
        .await
        .insert(voter_id.clone(), direct_tx.clone());

    // Send welcome message with every open ballot
    let polls = state.open_polls().await;
    let welcome = ServerMessage::Welcome {
        protocol: "1.0".to_string(),
        voter_id: voter_id.clone(),
        display_name,
        server_now: chrono::Utc::now().to_rfc3339(),
        polls: polls.iter().map(PollView::render).collect(),
    };

    if let Ok(msg) = serde_json::to_string(&welcome) {
        if sender.send(Message::Text(msg.into())).await.is_err() {
            tracing::error!("Failed to send welcome message");
            return;
        }
    }

    // Subscribe to poll announcements
    let mut broadcast_rx = state.broadcast.subscribe();

    loop {
        tokio::select! {
            // Announcements for everyone
            broadcast_msg = broadcast_rx.recv() => {
                if let Ok(msg) = broadcast_msg {
                    if let Ok(json) = serde_json::to_string(&msg) {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }

            // Private acks for this voter
            direct_msg = direct_rx.recv() => {
                match direct_msg {
                    Some(msg) => {
                        if let Ok(json) = serde_json::to_string(&msg) {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    None => break,
                }
            }

            // Client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if let Some(response) =
                                    handlers::handle_message(client_msg, &voter_id, &state).await
                                {
                                    if let Ok(json) = serde_json::to_string(&response) {
                                        if sender.send(Message::Text(json.into())).await.is_err() {
                                            tracing::error!("Failed to send response");
                                            break;
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                if let Ok(json) = serde_json::to_string(&error) {
                                    let _ = sender.send(Message::Text(json.into())).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Deregister the direct line, unless a reconnect already replaced it.
    {
        let mut direct = state.direct.write().await;
        if let Some(tx) = direct.get(&voter_id) {
            if tx.same_channel(&direct_tx) {
                direct.remove(&voter_id);
            }
        }
    }

    tracing::info!("WebSocket connection closed for voter {}", voter_id);
}
