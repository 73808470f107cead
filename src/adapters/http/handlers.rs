//! HTTP handlers for the room endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::EstimationAuthority;
use crate::domain::deck::DeckCatalog;
use crate::domain::foundation::{DomainError, ItemId, ParticipantId, RoomId, RoundId};
use crate::domain::room::ParticipantRole;

use super::dto::{
    ActorQuery, ActorRequest, AddItemRequest, CardRequest, CreateRoomRequest, CreateRoomResponse,
    DeckResponse, ErrorResponse, ItemResponse, JoinRoomRequest, ParticipantResponse,
    RevealResponse, RoomResponse, RoomSummaryResponse, RoundResponse, UpdateItemRequest,
    VoteProgressResponse, VoteResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct RoomHandlers {
    authority: Arc<EstimationAuthority>,
    /// Prepended to share paths in created-room responses, when configured.
    public_base_url: Option<String>,
}

impl RoomHandlers {
    pub fn new(authority: Arc<EstimationAuthority>, public_base_url: Option<String>) -> Self {
        Self {
            authority,
            public_base_url,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Rooms
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/rooms - Create a room with its facilitator
pub async fn create_room(
    State(handlers): State<RoomHandlers>,
    Json(req): Json<CreateRoomRequest>,
) -> Response {
    match handlers
        .authority
        .create_room(&req.name, &req.deck_type, handlers.public_base_url.as_deref())
        .await
    {
        Ok(created) => {
            (StatusCode::CREATED, Json(CreateRoomResponse::from(&created))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/rooms/:room_id - Room details
pub async fn get_room(
    State(handlers): State<RoomHandlers>,
    Path(room_id): Path<String>,
) -> Response {
    let room_id = match parse_room_id(&room_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.authority.get_room(&room_id).await {
        Ok(room) => (StatusCode::OK, Json(RoomResponse::from(&room))).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/rooms/:room_id/summary - Read model of the room's totals
pub async fn get_summary(
    State(handlers): State<RoomHandlers>,
    Path(room_id): Path<String>,
) -> Response {
    let room_id = match parse_room_id(&room_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.authority.get_summary(&room_id).await {
        Ok(summary) => {
            (StatusCode::OK, Json(RoomSummaryResponse::from(&summary))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/rooms/:room_id/join - Join as participant or observer
pub async fn join_room(
    State(handlers): State<RoomHandlers>,
    Path(room_id): Path<String>,
    Json(req): Json<JoinRoomRequest>,
) -> Response {
    let room_id = match parse_room_id(&room_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let role = req.role.unwrap_or(ParticipantRole::Participant);

    match handlers
        .authority
        .join_room(&room_id, &req.display_name, role)
        .await
    {
        Ok(participant) => {
            (StatusCode::CREATED, Json(ParticipantResponse::from(&participant))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/rooms/:room_id/leave - Mark a participant as having left
pub async fn leave_room(
    State(handlers): State<RoomHandlers>,
    Path(room_id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Response {
    let (room_id, participant_id) = match parse_actor(&room_id, &req.participant_id) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    match handlers.authority.leave_room(&room_id, &participant_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/rooms/:room_id/close - Close the room (facilitator only)
pub async fn close_room(
    State(handlers): State<RoomHandlers>,
    Path(room_id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Response {
    let (room_id, participant_id) = match parse_actor(&room_id, &req.participant_id) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    match handlers.authority.close_room(&room_id, &participant_id).await {
        Ok(room) => (StatusCode::OK, Json(RoomResponse::from(&room))).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/rooms/:room_id/participants - Active participants, join order
pub async fn list_participants(
    State(handlers): State<RoomHandlers>,
    Path(room_id): Path<String>,
) -> Response {
    let room_id = match parse_room_id(&room_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.authority.get_active_participants(&room_id).await {
        Ok(participants) => {
            let response: Vec<ParticipantResponse> =
                participants.iter().map(ParticipantResponse::from).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Items
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/rooms/:room_id/items - Items in display order
pub async fn list_items(
    State(handlers): State<RoomHandlers>,
    Path(room_id): Path<String>,
) -> Response {
    let room_id = match parse_room_id(&room_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.authority.get_items(&room_id).await {
        Ok(items) => {
            let response: Vec<ItemResponse> = items.iter().map(ItemResponse::from).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/rooms/:room_id/items - Add an item (facilitator only)
pub async fn add_item(
    State(handlers): State<RoomHandlers>,
    Path(room_id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Response {
    let (room_id, participant_id) = match parse_actor(&room_id, &req.participant_id) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    match handlers
        .authority
        .add_item(&room_id, &participant_id, &req.title, req.description)
        .await
    {
        Ok(item) => (StatusCode::CREATED, Json(ItemResponse::from(&item))).into_response(),
        Err(e) => error_response(e),
    }
}

/// PATCH /api/rooms/:room_id/items/:item_id - Edit before voting starts
pub async fn update_item(
    State(handlers): State<RoomHandlers>,
    Path((room_id, item_id)): Path<(String, String)>,
    Json(req): Json<UpdateItemRequest>,
) -> Response {
    let (room_id, item_id, participant_id) =
        match parse_item_actor(&room_id, &item_id, &req.participant_id) {
            Ok(ids) => ids,
            Err(response) => return response,
        };

    match handlers
        .authority
        .update_item(
            &room_id,
            &item_id,
            &participant_id,
            req.title.as_deref(),
            req.description,
        )
        .await
    {
        Ok(item) => (StatusCode::OK, Json(ItemResponse::from(&item))).into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/rooms/:room_id/items/:item_id - Remove with cascade
pub async fn remove_item(
    State(handlers): State<RoomHandlers>,
    Path((room_id, item_id)): Path<(String, String)>,
    Query(query): Query<ActorQuery>,
) -> Response {
    let (room_id, item_id, participant_id) =
        match parse_item_actor(&room_id, &item_id, &query.participant_id) {
            Ok(ids) => ids,
            Err(response) => return response,
        };

    match handlers
        .authority
        .remove_item(&room_id, &item_id, &participant_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Voting
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/rooms/:room_id/items/:item_id/vote - Cast or re-cast a vote
pub async fn cast_vote(
    State(handlers): State<RoomHandlers>,
    Path((room_id, item_id)): Path<(String, String)>,
    Json(req): Json<CardRequest>,
) -> Response {
    let (room_id, item_id, participant_id) =
        match parse_item_actor(&room_id, &item_id, &req.participant_id) {
            Ok(ids) => ids,
            Err(response) => return response,
        };

    match handlers
        .authority
        .cast_vote(&room_id, &item_id, &participant_id, &req.card_value)
        .await
    {
        Ok(progress) => {
            (StatusCode::OK, Json(VoteProgressResponse::from(progress))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/rooms/:room_id/items/:item_id/reveal - Reveal the round
pub async fn reveal_votes(
    State(handlers): State<RoomHandlers>,
    Path((room_id, item_id)): Path<(String, String)>,
    Json(req): Json<ActorRequest>,
) -> Response {
    let (room_id, item_id, participant_id) =
        match parse_item_actor(&room_id, &item_id, &req.participant_id) {
            Ok(ids) => ids,
            Err(response) => return response,
        };

    match handlers
        .authority
        .reveal_votes(&room_id, &item_id, &participant_id)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(RevealResponse::from(outcome))).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/rooms/:room_id/items/:item_id/revote - Start a fresh round
pub async fn start_revote(
    State(handlers): State<RoomHandlers>,
    Path((room_id, item_id)): Path<(String, String)>,
    Json(req): Json<ActorRequest>,
) -> Response {
    let (room_id, item_id, participant_id) =
        match parse_item_actor(&room_id, &item_id, &req.participant_id) {
            Ok(ids) => ids,
            Err(response) => return response,
        };

    match handlers
        .authority
        .start_revote(&room_id, &item_id, &participant_id)
        .await
    {
        Ok(round) => (StatusCode::CREATED, Json(RoundResponse::from(&round))).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/rooms/:room_id/items/:item_id/estimate - Record final estimate
pub async fn record_final_estimate(
    State(handlers): State<RoomHandlers>,
    Path((room_id, item_id)): Path<(String, String)>,
    Json(req): Json<CardRequest>,
) -> Response {
    let (room_id, item_id, participant_id) =
        match parse_item_actor(&room_id, &item_id, &req.participant_id) {
            Ok(ids) => ids,
            Err(response) => return response,
        };

    match handlers
        .authority
        .record_final_estimate(&room_id, &item_id, &participant_id, &req.card_value)
        .await
    {
        Ok(item) => (StatusCode::OK, Json(ItemResponse::from(&item))).into_response(),
        Err(e) => error_response(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Rounds
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/rooms/:room_id/rounds/:round_id - Round details
pub async fn get_round(
    State(handlers): State<RoomHandlers>,
    Path((room_id, round_id)): Path<(String, String)>,
) -> Response {
    let (room_id, round_id) = match parse_round(&room_id, &round_id) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    match handlers.authority.get_round(&room_id, &round_id).await {
        Ok(round) => (StatusCode::OK, Json(RoundResponse::from(&round))).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/rooms/:room_id/rounds/:round_id/votes - Votes of a round
///
/// Card values are only present once the round has been revealed.
pub async fn list_votes(
    State(handlers): State<RoomHandlers>,
    Path((room_id, round_id)): Path<(String, String)>,
) -> Response {
    let (room_id, round_id) = match parse_round(&room_id, &round_id) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    match handlers
        .authority
        .get_votes_by_round(&room_id, &round_id)
        .await
    {
        Ok(votes) => {
            let response: Vec<VoteResponse> = votes.iter().map(VoteResponse::from).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Decks
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/decks - Built-in deck catalog
pub async fn list_decks() -> Response {
    let decks: Vec<DeckResponse> = DeckCatalog::deck_types()
        .into_iter()
        .filter_map(|deck_type| {
            DeckCatalog::resolve(deck_type).ok().map(|values| DeckResponse {
                deck_type: deck_type.to_string(),
                values,
            })
        })
        .collect();
    (StatusCode::OK, Json(decks)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling and parsing
// ════════════════════════════════════════════════════════════════════════════

/// Maps each error kind to its status class: validation and lifecycle
/// failures → 400, missing entities → 404, authorization → 403.
fn error_response(error: DomainError) -> Response {
    let status = match error {
        DomainError::InvalidInput { .. }
        | DomainError::UnknownDeck(_)
        | DomainError::RoomClosed(_)
        | DomainError::NoActiveRound(_)
        | DomainError::InvalidState(_) => StatusCode::BAD_REQUEST,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::RoomNotFound(_)
        | DomainError::ParticipantNotFound(_)
        | DomainError::ItemNotFound(_)
        | DomainError::RoundNotFound(_) => StatusCode::NOT_FOUND,
    };
    (status, Json(ErrorResponse::from(&error))).into_response()
}

fn bad_id(what: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::bad_request(format!("Invalid {} ID", what))),
    )
        .into_response()
}

fn parse_room_id(raw: &str) -> Result<RoomId, Response> {
    raw.parse().map_err(|_| bad_id("room"))
}

fn parse_actor(room_id: &str, participant_id: &str) -> Result<(RoomId, ParticipantId), Response> {
    let room_id = parse_room_id(room_id)?;
    let participant_id = participant_id.parse().map_err(|_| bad_id("participant"))?;
    Ok((room_id, participant_id))
}

fn parse_item_actor(
    room_id: &str,
    item_id: &str,
    participant_id: &str,
) -> Result<(RoomId, ItemId, ParticipantId), Response> {
    let (room_id, participant_id) = parse_actor(room_id, participant_id)?;
    let item_id: ItemId = item_id.parse().map_err(|_| bad_id("item"))?;
    Ok((room_id, item_id, participant_id))
}

fn parse_round(room_id: &str, round_id: &str) -> Result<(RoomId, RoundId), Response> {
    let room_id = parse_room_id(room_id)?;
    let round_id = round_id.parse().map_err(|_| bad_id("round"))?;
    Ok((room_id, round_id))
}
