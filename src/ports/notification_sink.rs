//! NotificationSink port - how mutations fan out to room subscribers.
//!
//! The authority publishes through this port and never touches connection
//! objects, keeping the state machine decoupled from any transport.

use async_trait::async_trait;

use crate::domain::foundation::RoomId;
use crate::domain::room::RoomEvent;

/// Port for broadcasting room events to subscribed clients.
///
/// Implementations must ensure:
/// - delivery is best-effort, at-most-once per connected subscriber
/// - publishing to a room with no subscribers is a no-op
/// - `publish` never blocks on a slow subscriber
///
/// The authority treats publish failures as non-fatal: the mutation's
/// result is already durable when the sink is invoked.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers an event to every client subscribed to the room.
    async fn publish(&self, room_id: &RoomId, event: RoomEvent);
}
