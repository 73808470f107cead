//! Broadcast-channel fan-out for room events.
//!
//! Each room gets its own `tokio::sync::broadcast` channel, created lazily
//! on first subscription and torn down once the last subscriber is gone.
//! Publishing to a room with no channel (or no receivers) is a no-op.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use crate::domain::foundation::RoomId;
use crate::domain::room::RoomEvent;
use crate::ports::NotificationSink;

/// Default buffer size per room channel. Slow subscribers that fall more
/// than this many events behind miss the overwritten ones and must
/// re-fetch state over HTTP.
const DEFAULT_CHANNEL_CAPACITY: usize = 128;

/// Routes room events to every subscribed client connection.
///
/// # Thread safety
///
/// The registry sits behind an `RwLock` since broadcasts (reads) vastly
/// outnumber subscribes/releases (writes), letting publishes to different
/// rooms proceed concurrently.
pub struct BroadcastSink {
    rooms: RwLock<HashMap<RoomId, broadcast::Sender<RoomEvent>>>,
    channel_capacity: usize,
}

impl BroadcastSink {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Subscribes to a room's event stream, creating the channel if this
    /// is the room's first subscriber.
    pub async fn subscribe(&self, room_id: &RoomId) -> broadcast::Receiver<RoomEvent> {
        let mut rooms = self.rooms.write().await;
        let sender = rooms.entry(*room_id).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.channel_capacity);
            tx
        });
        sender.subscribe()
    }

    /// Drops the room's channel if no subscribers remain. Called after a
    /// connection closes; a no-op while other subscribers are attached.
    pub async fn release(&self, room_id: &RoomId) {
        let mut rooms = self.rooms.write().await;
        if let Some(sender) = rooms.get(room_id) {
            if sender.receiver_count() == 0 {
                rooms.remove(room_id);
            }
        }
    }

    /// Count of live subscribers for a room (0 if no channel exists).
    pub async fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Rooms that currently have a channel, for monitoring.
    pub async fn active_rooms(&self) -> Vec<RoomId> {
        self.rooms.read().await.keys().copied().collect()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl NotificationSink for BroadcastSink {
    async fn publish(&self, room_id: &RoomId, event: RoomEvent) {
        let rooms = self.rooms.read().await;
        if let Some(sender) = rooms.get(room_id) {
            // A send error means every receiver disconnected between the
            // lookup and the send; the event is simply dropped.
            if sender.send(event).is_err() {
                tracing::debug!(room_id = %room_id, "event dropped, no live subscribers");
            }
        }
    }
}
