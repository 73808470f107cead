//! Room aggregate - the voting session container.
//!
//! # Invariants
//!
//! - exactly one facilitator id per room, set at creation, immutable
//! - deck values are copied at creation; later catalog edits never
//!   retroactively change an in-progress room
//! - the OPEN → CLOSED transition happens at most once

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ParticipantId, RoomId, Timestamp};

/// Maximum length for a room name.
pub const MAX_ROOM_NAME_LENGTH: usize = 200;

/// Lifecycle state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomState {
    Open,
    Closed,
}

/// One estimation session with a facilitator and any number of
/// participants and observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    id: RoomId,
    name: String,
    deck_type: String,
    deck_values: Vec<String>,
    state: RoomState,
    facilitator_id: ParticipantId,
    created_at: Timestamp,
    closed_at: Option<Timestamp>,
}

impl Room {
    /// Creates a new open room.
    ///
    /// `deck_values` must already be resolved from the catalog; the room
    /// keeps its own copy.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the trimmed name is empty or too long
    pub fn new(
        id: RoomId,
        name: &str,
        deck_type: String,
        deck_values: Vec<String>,
        facilitator_id: ParticipantId,
    ) -> Result<Self, DomainError> {
        let name = Self::validate_name(name)?;

        Ok(Self {
            id,
            name,
            deck_type,
            deck_values,
            state: RoomState::Open,
            facilitator_id,
            created_at: Timestamp::now(),
            closed_at: None,
        })
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deck_type(&self) -> &str {
        &self.deck_type
    }

    pub fn deck_values(&self) -> &[String] {
        &self.deck_values
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn facilitator_id(&self) -> &ParticipantId {
        &self.facilitator_id
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn closed_at(&self) -> Option<&Timestamp> {
        self.closed_at.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.state == RoomState::Open
    }

    /// Shareable path for joining this room.
    pub fn share_path(&self) -> String {
        format!("/room/{}", self.id)
    }

    /// Checks whether a card value belongs to this room's deck.
    pub fn allows_card(&self, card_value: &str) -> bool {
        self.deck_values.iter().any(|v| v == card_value)
    }

    /// Validates that the room still accepts mutations.
    ///
    /// # Errors
    ///
    /// - `RoomClosed` if the room has been closed
    pub fn ensure_open(&self) -> Result<(), DomainError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DomainError::RoomClosed(self.id))
        }
    }

    /// Validates that the caller is this room's facilitator.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the participant is not the facilitator
    pub fn ensure_facilitator(&self, participant_id: &ParticipantId) -> Result<(), DomainError> {
        if &self.facilitator_id == participant_id {
            Ok(())
        } else {
            Err(DomainError::facilitator_only())
        }
    }

    /// Closes the room. Idempotent: returns `false` when already closed.
    pub fn close(&mut self) -> bool {
        if self.state == RoomState::Closed {
            return false;
        }
        self.state = RoomState::Closed;
        self.closed_at = Some(Timestamp::now());
        true
    }

    fn validate_name(name: &str) -> Result<String, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_input("name", "Room name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_ROOM_NAME_LENGTH {
            return Err(DomainError::invalid_input(
                "name",
                format!("Room name must be {} characters or less", MAX_ROOM_NAME_LENGTH),
            ));
        }
        Ok(trimmed.to_string())
    }
}
