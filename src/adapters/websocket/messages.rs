//! WebSocket message types for live room subscriptions.
//!
//! Protocol between server and connected clients:
//! - Server → Client: connection confirmation, room events, pings
//! - Client → Server: pings, explicit leave

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ParticipantId, RoomId, Timestamp};
use crate::domain::room::RoomEvent;

/// All message types sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established and subscription admitted.
    Connected {
        room_id: String,
        participant_id: String,
        timestamp: String,
    },

    /// A room event, forwarded verbatim from the fan-out channel.
    #[serde(rename = "room.event")]
    Event { event: RoomEvent, timestamp: String },

    /// Heartbeat response.
    Pong { timestamp: String },
}

impl ServerMessage {
    pub fn connected(room_id: &RoomId, participant_id: &ParticipantId) -> Self {
        ServerMessage::Connected {
            room_id: room_id.to_string(),
            participant_id: participant_id.to_string(),
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }

    pub fn event(event: RoomEvent) -> Self {
        ServerMessage::Event {
            event,
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }

    pub fn pong() -> Self {
        ServerMessage::Pong {
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }
}

/// All message types received from clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat request.
    Ping,

    /// Explicit leave; the server also treats a dropped connection as an
    /// implicit leave.
    Leave,
}
