//! Vote entity - one participant's card selection within one round.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ParticipantId, RoundId, Timestamp, VoteId};

/// One participant's card selection in a round.
///
/// At most one vote exists per (round, participant); re-casting while the
/// round is VOTING overwrites the card value in place. Votes are immutable
/// once the round leaves VOTING, except for the `is_revealed` flip applied
/// uniformly at reveal time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    id: VoteId,
    round_id: RoundId,
    participant_id: ParticipantId,
    card_value: String,
    voted_at: Timestamp,
    is_revealed: bool,
}

impl Vote {
    /// Creates a new hidden vote.
    pub fn new(
        id: VoteId,
        round_id: RoundId,
        participant_id: ParticipantId,
        card_value: String,
    ) -> Self {
        Self {
            id,
            round_id,
            participant_id,
            card_value,
            voted_at: Timestamp::now(),
            is_revealed: false,
        }
    }

    pub fn id(&self) -> &VoteId {
        &self.id
    }

    pub fn round_id(&self) -> &RoundId {
        &self.round_id
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    pub fn card_value(&self) -> &str {
        &self.card_value
    }

    pub fn voted_at(&self) -> &Timestamp {
        &self.voted_at
    }

    pub fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    /// Overwrites the selection; the caller must have checked the round is
    /// still VOTING.
    pub fn recast(&mut self, card_value: String) {
        self.card_value = card_value;
        self.voted_at = Timestamp::now();
    }

    /// Flips the vote visible. Applied to every vote of a round at reveal.
    pub fn mark_revealed(&mut self) {
        self.is_revealed = true;
    }
}
