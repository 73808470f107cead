//! Room summary - denormalized read model of one room's lifetime.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RoomId, Timestamp};

/// Running totals for one room, maintained incrementally at the same
/// transaction boundary as the mutation that changes them. One-to-one with
/// its room; a pure read model with no invariants of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    room_id: RoomId,
    total_participants: u32,
    total_items_estimated: u32,
    created_at: Timestamp,
    closed_at: Option<Timestamp>,
}

impl RoomSummary {
    /// Creates the summary alongside its room. The facilitator counts as
    /// the first participant.
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            total_participants: 1,
            total_items_estimated: 0,
            created_at: Timestamp::now(),
            closed_at: None,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn total_participants(&self) -> u32 {
        self.total_participants
    }

    pub fn total_items_estimated(&self) -> u32 {
        self.total_items_estimated
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn closed_at(&self) -> Option<&Timestamp> {
        self.closed_at.as_ref()
    }

    /// Counts a join.
    pub fn record_join(&mut self) {
        self.total_participants += 1;
    }

    /// Replaces the finalized-item count after a finalize.
    pub fn set_items_estimated(&mut self, count: u32) {
        self.total_items_estimated = count;
    }

    /// Mirrors the room's close.
    pub fn mark_closed(&mut self) {
        self.closed_at = Some(Timestamp::now());
    }
}
