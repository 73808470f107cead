//! WebSocket adapter - live event subscriptions per room.

mod handler;
mod messages;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use messages::{ClientMessage, ServerMessage};
