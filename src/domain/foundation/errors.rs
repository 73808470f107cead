//! Error types for the domain layer.
//!
//! Every failed operation is reported synchronously to the single caller
//! and leaves all state unchanged; validation always precedes mutation.

use thiserror::Error;

use super::{ItemId, ParticipantId, RoomId, RoundId};

/// Errors returned by estimation operations.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// A field was malformed or out of range.
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// The requested deck type is not registered in the catalog.
    #[error("Unknown deck type '{0}'")]
    UnknownDeck(String),

    /// No room exists with the given identifier.
    #[error("Room {0} not found")]
    RoomNotFound(RoomId),

    /// The room has been closed and no longer accepts this operation.
    #[error("Room {0} is closed")]
    RoomClosed(RoomId),

    /// The participant does not exist, is inactive, or belongs to a
    /// different room.
    #[error("Participant {0} not found")]
    ParticipantNotFound(ParticipantId),

    /// No item exists with the given identifier in this room.
    #[error("Item {0} not found")]
    ItemNotFound(ItemId),

    /// No round exists with the given identifier.
    #[error("Round {0} not found")]
    RoundNotFound(RoundId),

    /// The item has no current voting round (already finalized).
    #[error("Item {0} has no active round")]
    NoActiveRound(ItemId),

    /// The caller lacks the required role or identity for this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The operation is not valid for the entity's current lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl DomainError {
    /// Creates an `InvalidInput` error for a specific field.
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a `Forbidden` error naming the required role.
    pub fn facilitator_only() -> Self {
        DomainError::Forbidden("Only the facilitator may perform this operation".to_string())
    }

    /// Stable machine-readable code for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidInput { .. } => "INVALID_INPUT",
            DomainError::UnknownDeck(_) => "UNKNOWN_DECK",
            DomainError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            DomainError::RoomClosed(_) => "ROOM_CLOSED",
            DomainError::ParticipantNotFound(_) => "PARTICIPANT_NOT_FOUND",
            DomainError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            DomainError::RoundNotFound(_) => "ROUND_NOT_FOUND",
            DomainError::NoActiveRound(_) => "NO_ACTIVE_ROUND",
            DomainError::Forbidden(_) => "FORBIDDEN",
            DomainError::InvalidState(_) => "INVALID_STATE",
        }
    }
}
