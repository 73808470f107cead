//! Item entity - one estimable unit of work within a room.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ItemId, RoomId, RoundId, Timestamp};

/// Maximum length for an item title.
pub const MAX_ITEM_TITLE_LENGTH: usize = 200;

/// Maximum length for an item description.
pub const MAX_ITEM_DESCRIPTION_LENGTH: usize = 2000;

/// One unit of work being estimated.
///
/// `order` values strictly increase per room and are never reused, even
/// after the highest-ordered item is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    room_id: RoomId,
    title: String,
    description: Option<String>,
    order: u32,
    final_estimate: Option<String>,
    final_estimate_recorded_at: Option<Timestamp>,
    created_at: Timestamp,
    current_round_id: Option<RoundId>,
}

impl Item {
    /// Creates a new item pointing at its first voting round.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if title or description fail validation
    pub fn new(
        id: ItemId,
        room_id: RoomId,
        title: &str,
        description: Option<String>,
        order: u32,
        current_round_id: RoundId,
    ) -> Result<Self, DomainError> {
        let title = Self::validate_title(title)?;
        Self::validate_description(description.as_deref())?;

        Ok(Self {
            id,
            room_id,
            title,
            description,
            order,
            final_estimate: None,
            final_estimate_recorded_at: None,
            created_at: Timestamp::now(),
            current_round_id: Some(current_round_id),
        })
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn final_estimate(&self) -> Option<&str> {
        self.final_estimate.as_deref()
    }

    pub fn final_estimate_recorded_at(&self) -> Option<&Timestamp> {
        self.final_estimate_recorded_at.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn current_round_id(&self) -> Option<&RoundId> {
        self.current_round_id.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.final_estimate.is_some()
    }

    /// Applies the provided fields, each revalidated.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if a provided field fails validation
    pub fn update(
        &mut self,
        title: Option<&str>,
        description: Option<String>,
    ) -> Result<(), DomainError> {
        let validated_title = title.map(Self::validate_title).transpose()?;
        if description.is_some() {
            Self::validate_description(description.as_deref())?;
        }

        if let Some(new_title) = validated_title {
            self.title = new_title;
        }
        if let Some(new_description) = description {
            self.description = Some(new_description);
        }
        Ok(())
    }

    /// Re-points the item at a fresh voting round.
    pub fn point_to_round(&mut self, round_id: RoundId) {
        self.current_round_id = Some(round_id);
    }

    /// Records the facilitator-confirmed estimate and ends estimation for
    /// this item.
    pub fn record_final_estimate(&mut self, card_value: String) {
        self.final_estimate = Some(card_value);
        self.final_estimate_recorded_at = Some(Timestamp::now());
        self.current_round_id = None;
    }

    fn validate_title(title: &str) -> Result<String, DomainError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_input("title", "Title cannot be empty"));
        }
        if trimmed.chars().count() > MAX_ITEM_TITLE_LENGTH {
            return Err(DomainError::invalid_input(
                "title",
                format!("Title must be {} characters or less", MAX_ITEM_TITLE_LENGTH),
            ));
        }
        Ok(trimmed.to_string())
    }

    fn validate_description(description: Option<&str>) -> Result<(), DomainError> {
        if let Some(description) = description {
            if description.chars().count() > MAX_ITEM_DESCRIPTION_LENGTH {
                return Err(DomainError::invalid_input(
                    "description",
                    format!(
                        "Description must be {} characters or less",
                        MAX_ITEM_DESCRIPTION_LENGTH
                    ),
                ));
            }
        }
        Ok(())
    }
}
