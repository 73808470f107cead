//! Participant entity - one user's membership in one room.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ParticipantId, RoomId, Timestamp};

/// Maximum length for a participant display name.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;

/// What a participant may do inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    /// Runs the session: manages items, reveals, re-votes, finalizes,
    /// and closes the room. Assigned only at room creation.
    Facilitator,
    /// Casts votes.
    Participant,
    /// Views the session but never votes.
    Observer,
}

impl ParticipantRole {
    /// Whether this role is counted among voting-eligible participants.
    pub fn can_vote(&self) -> bool {
        !matches!(self, ParticipantRole::Observer)
    }
}

/// One user's membership in one room.
///
/// Members are never hard-deleted; leaving marks them inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    id: ParticipantId,
    room_id: RoomId,
    display_name: String,
    role: ParticipantRole,
    joined_at: Timestamp,
    left_at: Option<Timestamp>,
    is_active: bool,
}

impl Participant {
    /// Creates a new active participant.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the trimmed display name is empty or too long
    pub fn new(
        id: ParticipantId,
        room_id: RoomId,
        display_name: &str,
        role: ParticipantRole,
    ) -> Result<Self, DomainError> {
        let display_name = Self::validate_display_name(display_name)?;

        Ok(Self {
            id,
            room_id,
            display_name,
            role,
            joined_at: Timestamp::now(),
            left_at: None,
            is_active: true,
        })
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn role(&self) -> ParticipantRole {
        self.role
    }

    pub fn joined_at(&self) -> &Timestamp {
        &self.joined_at
    }

    pub fn left_at(&self) -> Option<&Timestamp> {
        self.left_at.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Marks the participant as having left. Idempotent: returns `false`
    /// when already inactive.
    pub fn leave(&mut self) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        self.left_at = Some(Timestamp::now());
        true
    }

    fn validate_display_name(display_name: &str) -> Result<String, DomainError> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_input(
                "display_name",
                "Display name cannot be empty",
            ));
        }
        if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
            return Err(DomainError::invalid_input(
                "display_name",
                format!(
                    "Display name must be {} characters or less",
                    MAX_DISPLAY_NAME_LENGTH
                ),
            ));
        }
        Ok(trimmed.to_string())
    }
}
