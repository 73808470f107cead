//! WebSocket upgrade handler for live room subscriptions.
//!
//! Connection lifecycle:
//! 1. Validate the room exists and the participant is active in it
//! 2. Upgrade to WebSocket and subscribe to the room's event channel
//! 3. Forward broadcasts to the client, answer pings, until disconnect
//! 4. On disconnect: implicit leave and channel cleanup

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::adapters::events::BroadcastSink;
use crate::application::EstimationAuthority;
use crate::domain::foundation::{ParticipantId, RoomId};
use crate::domain::room::RoomEvent;

use super::messages::{ClientMessage, ServerMessage};

/// Shared state for the WebSocket endpoint.
#[derive(Clone)]
pub struct WebSocketState {
    pub authority: Arc<EstimationAuthority>,
    pub sink: Arc<BroadcastSink>,
}

impl WebSocketState {
    pub fn new(authority: Arc<EstimationAuthority>, sink: Arc<BroadcastSink>) -> Self {
        Self { authority, sink }
    }
}

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    participant_id: String,
}

/// Handles upgrade requests for `GET /api/rooms/:room_id/live`.
///
/// The subscription is only admitted for participants that are currently
/// active in the room; everyone else is rejected before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(query): Query<LiveQuery>,
    State(state): State<WebSocketState>,
) -> Response {
    let room_id: RoomId = match room_id.parse() {
        Ok(id) => id,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid room ID").into_response(),
    };
    let participant_id: ParticipantId = match query.participant_id.parse() {
        Ok(id) => id,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid participant ID").into_response(),
    };

    match state
        .authority
        .is_active_participant(&room_id, &participant_id)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            return (StatusCode::FORBIDDEN, "Not an active participant of this room")
                .into_response()
        }
        Err(_) => return (StatusCode::NOT_FOUND, "Room not found").into_response(),
    }

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, participant_id, state))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(
    socket: WebSocket,
    room_id: RoomId,
    participant_id: ParticipantId,
    state: WebSocketState,
) {
    let mut room_rx = state.sink.subscribe(&room_id).await;
    let (mut sender, mut receiver) = socket.split();

    let connected = ServerMessage::connected(&room_id, &participant_id);
    if send_message(&mut sender, &connected).await.is_err() {
        // Client disconnected before the handshake completed.
        close_session(&state, &room_id, &participant_id, room_rx).await;
        return;
    }

    tracing::debug!(%room_id, %participant_id, "live subscription opened");

    loop {
        tokio::select! {
            event = room_rx.recv() => match event {
                Ok(event) => {
                    let msg = ServerMessage::event(event);
                    if send_message(&mut sender, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        %room_id,
                        %participant_id,
                        skipped,
                        "subscriber lagged, events dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Ping) => {
                            if send_message(&mut sender, &ServerMessage::pong()).await.is_err() {
                                break;
                            }
                        }
                        Ok(ClientMessage::Leave) => break,
                        Err(e) => {
                            tracing::debug!(%participant_id, "unparseable client message: {}", e);
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    // Binary frames unsupported; protocol ping/pong is
                    // handled by axum itself.
                }
                Some(Err(e)) => {
                    tracing::debug!(%participant_id, "receive error: {}", e);
                    break;
                }
            },
        }
    }

    close_session(&state, &room_id, &participant_id, room_rx).await;
}

/// Tears down one connection: a dropped or closed socket counts as leaving
/// the room, and the subscription is handed back to the sink for cleanup.
/// Every exit path, including a failed handshake, goes through here.
async fn close_session(
    state: &WebSocketState,
    room_id: &RoomId,
    participant_id: &ParticipantId,
    room_rx: broadcast::Receiver<RoomEvent>,
) {
    if let Err(e) = state.authority.leave_room(room_id, participant_id).await {
        tracing::debug!(%room_id, %participant_id, "implicit leave failed: {}", e);
    }

    drop(room_rx);
    state.sink.release(room_id).await;
    tracing::debug!(%room_id, %participant_id, "live subscription closed");
}

/// Sends a JSON message over the WebSocket.
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json)).await,
        Err(e) => Err(axum::Error::new(e)),
    }
}

/// Router for the live subscription endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/rooms/:room_id/live", get(ws_handler))
}
