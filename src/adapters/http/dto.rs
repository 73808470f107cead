//! HTTP DTOs for the room endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent
//! evolution. Timestamps travel as RFC 3339 strings.

use serde::{Deserialize, Serialize};

use crate::application::{CreatedRoom, RevealOutcome, VoteProgress};
use crate::domain::foundation::DomainError;
use crate::domain::room::{
    Item, Participant, ParticipantRole, RevealedVote, Room, RoomState, RoomSummary, Round,
    RoundState, Vote,
};
use crate::domain::statistics::VoteStatistics;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to create a new room.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub deck_type: String,
}

/// Request to join a room. Role defaults to `PARTICIPANT`.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRoomRequest {
    pub display_name: String,
    #[serde(default)]
    pub role: Option<ParticipantRole>,
}

/// Body carrying only the acting participant.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorRequest {
    pub participant_id: String,
}

/// Query-string form of the acting participant, for bodyless requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorQuery {
    pub participant_id: String,
}

/// Request to add an item.
#[derive(Debug, Clone, Deserialize)]
pub struct AddItemRequest {
    pub participant_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to update an item; absent fields are left untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateItemRequest {
    pub participant_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to cast a vote or record a final estimate.
#[derive(Debug, Clone, Deserialize)]
pub struct CardRequest {
    pub participant_id: String,
    pub card_value: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct RoomResponse {
    pub id: String,
    pub name: String,
    pub deck_type: String,
    pub deck_values: Vec<String>,
    pub state: RoomState,
    pub facilitator_id: String,
    pub share_path: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
}

impl From<&Room> for RoomResponse {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id().to_string(),
            name: room.name().to_string(),
            deck_type: room.deck_type().to_string(),
            deck_values: room.deck_values().to_vec(),
            state: room.state(),
            facilitator_id: room.facilitator_id().to_string(),
            share_path: room.share_path(),
            created_at: room.created_at().to_rfc3339(),
            closed_at: room.closed_at().map(|ts| ts.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRoomResponse {
    pub room: RoomResponse,
    pub facilitator: ParticipantResponse,
    pub share_link: String,
}

impl From<&CreatedRoom> for CreateRoomResponse {
    fn from(created: &CreatedRoom) -> Self {
        Self {
            room: RoomResponse::from(&created.room),
            facilitator: ParticipantResponse::from(&created.facilitator),
            share_link: created.share_link.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantResponse {
    pub id: String,
    pub display_name: String,
    pub role: ParticipantRole,
    pub joined_at: String,
    pub is_active: bool,
}

impl From<&Participant> for ParticipantResponse {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id().to_string(),
            display_name: participant.display_name().to_string(),
            role: participant.role(),
            joined_at: participant.joined_at().to_rfc3339(),
            is_active: participant.is_active(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_round_id: Option<String>,
    pub created_at: String,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id().to_string(),
            title: item.title().to_string(),
            description: item.description().map(str::to_string),
            order: item.order(),
            final_estimate: item.final_estimate().map(str::to_string),
            current_round_id: item.current_round_id().map(|id| id.to_string()),
            created_at: item.created_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundResponse {
    pub id: String,
    pub item_id: String,
    pub round_number: u32,
    pub state: RoundState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes_revealed_at: Option<String>,
    pub created_at: String,
}

impl From<&Round> for RoundResponse {
    fn from(round: &Round) -> Self {
        Self {
            id: round.id().to_string(),
            item_id: round.item_id().to_string(),
            round_number: round.round_number(),
            state: round.state(),
            votes_revealed_at: round.votes_revealed_at().map(|ts| ts.to_rfc3339()),
            created_at: round.created_at().to_rfc3339(),
        }
    }
}

/// One vote. The card value is withheld until the round is revealed.
#[derive(Debug, Clone, Serialize)]
pub struct VoteResponse {
    pub id: String,
    pub participant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_value: Option<String>,
    pub voted_at: String,
    pub is_revealed: bool,
}

impl From<&Vote> for VoteResponse {
    fn from(vote: &Vote) -> Self {
        Self {
            id: vote.id().to_string(),
            participant_id: vote.participant_id().to_string(),
            card_value: vote
                .is_revealed()
                .then(|| vote.card_value().to_string()),
            voted_at: vote.voted_at().to_rfc3339(),
            is_revealed: vote.is_revealed(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteProgressResponse {
    pub item_id: String,
    pub voted_count: u32,
    pub total_count: u32,
}

impl From<VoteProgress> for VoteProgressResponse {
    fn from(progress: VoteProgress) -> Self {
        Self {
            item_id: progress.item_id.to_string(),
            voted_count: progress.voted_count,
            total_count: progress.total_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RevealResponse {
    pub item_id: String,
    pub round_id: String,
    pub votes: Vec<RevealedVote>,
    pub statistics: VoteStatistics,
}

impl From<RevealOutcome> for RevealResponse {
    fn from(outcome: RevealOutcome) -> Self {
        Self {
            item_id: outcome.item_id.to_string(),
            round_id: outcome.round_id.to_string(),
            votes: outcome.votes,
            statistics: outcome.statistics,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSummaryResponse {
    pub room_id: String,
    pub total_participants: u32,
    pub total_items_estimated: u32,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
}

impl From<&RoomSummary> for RoomSummaryResponse {
    fn from(summary: &RoomSummary) -> Self {
        Self {
            room_id: summary.room_id().to_string(),
            total_participants: summary.total_participants(),
            total_items_estimated: summary.total_items_estimated(),
            created_at: summary.created_at().to_rfc3339(),
            closed_at: summary.closed_at().map(|ts| ts.to_rfc3339()),
        }
    }
}

/// One built-in deck, for the catalog listing.
#[derive(Debug, Clone, Serialize)]
pub struct DeckResponse {
    pub deck_type: String,
    pub values: Vec<String>,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "INVALID_INPUT".to_string(),
            message: message.into(),
        }
    }
}

impl From<&DomainError> for ErrorResponse {
    fn from(error: &DomainError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ItemId, ParticipantId, RoomId, RoundId, VoteId};

    #[test]
    fn create_room_request_deserializes() {
        let json = r#"{"name": "Sprint 1", "deck_type": "FIBONACCI"}"#;
        let req: CreateRoomRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.name, "Sprint 1");
        assert_eq!(req.deck_type, "FIBONACCI");
    }

    #[test]
    fn join_request_role_defaults_to_none() {
        let json = r#"{"display_name": "Alex"}"#;
        let req: JoinRoomRequest = serde_json::from_str(json).unwrap();
        assert!(req.role.is_none());

        let json = r#"{"display_name": "Alex", "role": "OBSERVER"}"#;
        let req: JoinRoomRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.role, Some(ParticipantRole::Observer));
    }

    #[test]
    fn room_response_carries_share_path() {
        let room = Room::new(
            RoomId::new(),
            "Sprint 1",
            "FIBONACCI".to_string(),
            vec!["1".to_string()],
            ParticipantId::new(),
        )
        .unwrap();
        let response = RoomResponse::from(&room);
        assert_eq!(response.share_path, format!("/room/{}", response.id));
        assert!(response.closed_at.is_none());
    }

    #[test]
    fn vote_response_hides_value_until_revealed() {
        let mut vote = Vote::new(
            VoteId::new(),
            RoundId::new(),
            ParticipantId::new(),
            "5".to_string(),
        );

        let hidden = VoteResponse::from(&vote);
        assert!(hidden.card_value.is_none());

        vote.mark_revealed();
        let revealed = VoteResponse::from(&vote);
        assert_eq!(revealed.card_value, Some("5".to_string()));
    }

    #[test]
    fn item_response_skips_absent_fields() {
        let item = Item::new(
            ItemId::new(),
            RoomId::new(),
            "Login page",
            None,
            1,
            RoundId::new(),
        )
        .unwrap();
        let json = serde_json::to_string(&ItemResponse::from(&item)).unwrap();
        assert!(!json.contains("final_estimate"));
        assert!(!json.contains("description"));
    }

    #[test]
    fn error_response_carries_domain_code() {
        let error = DomainError::RoomNotFound(RoomId::new());
        let response = ErrorResponse::from(&error);
        assert_eq!(response.code, "ROOM_NOT_FOUND");
        assert!(!response.message.is_empty());
    }
}
