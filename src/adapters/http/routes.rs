//! HTTP routes for the room endpoints.

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{
    add_item, cast_vote, close_room, create_room, get_room, get_round, get_summary, join_room,
    leave_room, list_decks, list_items, list_participants, list_votes, record_final_estimate,
    remove_item, reveal_votes, start_revote, update_item, RoomHandlers,
};

/// Creates the room router with all endpoints.
pub fn room_routes(handlers: RoomHandlers) -> Router {
    Router::new()
        .route("/decks", get(list_decks))
        .route("/rooms", post(create_room))
        .route("/rooms/:room_id", get(get_room))
        .route("/rooms/:room_id/summary", get(get_summary))
        .route("/rooms/:room_id/join", post(join_room))
        .route("/rooms/:room_id/leave", post(leave_room))
        .route("/rooms/:room_id/close", post(close_room))
        .route("/rooms/:room_id/participants", get(list_participants))
        .route("/rooms/:room_id/items", get(list_items).post(add_item))
        .route(
            "/rooms/:room_id/items/:item_id",
            patch(update_item).delete(remove_item),
        )
        .route("/rooms/:room_id/items/:item_id/vote", post(cast_vote))
        .route("/rooms/:room_id/items/:item_id/reveal", post(reveal_votes))
        .route("/rooms/:room_id/items/:item_id/revote", post(start_revote))
        .route(
            "/rooms/:room_id/items/:item_id/estimate",
            post(record_final_estimate),
        )
        .route("/rooms/:room_id/rounds/:round_id", get(get_round))
        .route("/rooms/:room_id/rounds/:round_id/votes", get(list_votes))
        .with_state(handlers)
}
