//! Room-scoped events fanned out to every subscribed client.
//!
//! Events are fire-and-forget relative to the mutation that produced them:
//! the operation result is returned to the caller whether or not any
//! subscriber receives the broadcast. Delivery is best-effort, at-most-once
//! per connected subscriber, with no replay; a reconnecting client re-fetches
//! current state through the queries instead.

use serde::Serialize;

use crate::domain::foundation::{ItemId, ParticipantId, RoundId, Timestamp};
use crate::domain::statistics::VoteStatistics;

use super::{Item, Participant, ParticipantRole};

/// Lightweight item payload embedded in events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_round_id: Option<RoundId>,
}

impl From<&Item> for ItemSnapshot {
    fn from(item: &Item) -> Self {
        Self {
            id: *item.id(),
            title: item.title().to_string(),
            description: item.description().map(str::to_string),
            order: item.order(),
            final_estimate: item.final_estimate().map(str::to_string),
            current_round_id: item.current_round_id().copied(),
        }
    }
}

/// One revealed vote joined with its voter's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevealedVote {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub card_value: String,
}

/// Everything broadcast to a room's subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    ParticipantJoined {
        participant_id: ParticipantId,
        display_name: String,
        role: ParticipantRole,
        joined_at: Timestamp,
    },
    ParticipantLeft {
        participant_id: ParticipantId,
        display_name: String,
    },
    RoomClosed {
        closed_at: Timestamp,
    },
    ItemAdded {
        item: ItemSnapshot,
    },
    ItemUpdated {
        item: ItemSnapshot,
    },
    ItemRemoved {
        item_id: ItemId,
    },
    /// Progress only; card values stay hidden until reveal.
    VoteCountChanged {
        item_id: ItemId,
        voted_count: u32,
        total_count: u32,
    },
    VotesRevealed {
        item_id: ItemId,
        votes: Vec<RevealedVote>,
        statistics: VoteStatistics,
    },
    RevoteStarted {
        item_id: ItemId,
        round_number: u32,
    },
    FinalEstimateRecorded {
        item: ItemSnapshot,
        final_estimate: String,
    },
}

impl RoomEvent {
    /// Builds the joined-event payload for a participant.
    pub fn participant_joined(participant: &Participant) -> Self {
        RoomEvent::ParticipantJoined {
            participant_id: *participant.id(),
            display_name: participant.display_name().to_string(),
            role: participant.role(),
            joined_at: *participant.joined_at(),
        }
    }

    /// Stable event name, matching the wire `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::ParticipantJoined { .. } => "participant_joined",
            RoomEvent::ParticipantLeft { .. } => "participant_left",
            RoomEvent::RoomClosed { .. } => "room_closed",
            RoomEvent::ItemAdded { .. } => "item_added",
            RoomEvent::ItemUpdated { .. } => "item_updated",
            RoomEvent::ItemRemoved { .. } => "item_removed",
            RoomEvent::VoteCountChanged { .. } => "vote_count_changed",
            RoomEvent::VotesRevealed { .. } => "votes_revealed",
            RoomEvent::RevoteStarted { .. } => "revote_started",
            RoomEvent::FinalEstimateRecorded { .. } => "final_estimate_recorded",
        }
    }
}
