//! Round entity - one voting attempt on one item.
//!
//! State machine: `VOTING --reveal--> REVEALED --revote--> VOTING(n+1)`;
//! `REVEALED --finalize--> FINALIZED` (terminal).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ItemId, RoundId, Timestamp};

/// Lifecycle state of a voting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundState {
    Voting,
    Revealed,
    Finalized,
}

/// One voting attempt on an item. An item may accumulate several rounds
/// over its lifetime through re-votes; only the one referenced by the
/// item's `current_round_id` is current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    id: RoundId,
    item_id: ItemId,
    round_number: u32,
    state: RoundState,
    votes_revealed_at: Option<Timestamp>,
    created_at: Timestamp,
    finalized_at: Option<Timestamp>,
}

impl Round {
    /// Creates a new round in the VOTING state.
    pub fn new(id: RoundId, item_id: ItemId, round_number: u32) -> Self {
        Self {
            id,
            item_id,
            round_number,
            state: RoundState::Voting,
            votes_revealed_at: None,
            created_at: Timestamp::now(),
            finalized_at: None,
        }
    }

    pub fn id(&self) -> &RoundId {
        &self.id
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn votes_revealed_at(&self) -> Option<&Timestamp> {
        self.votes_revealed_at.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn finalized_at(&self) -> Option<&Timestamp> {
        self.finalized_at.as_ref()
    }

    /// Validates that the round still accepts votes.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the round has left VOTING
    pub fn ensure_voting(&self) -> Result<(), DomainError> {
        if self.state == RoundState::Voting {
            Ok(())
        } else {
            Err(DomainError::InvalidState(format!(
                "Round {} is no longer accepting votes",
                self.round_number
            )))
        }
    }

    /// Transitions VOTING → REVEALED.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless the round is in VOTING
    pub fn reveal(&mut self) -> Result<(), DomainError> {
        if self.state != RoundState::Voting {
            return Err(DomainError::InvalidState(format!(
                "Round {} has already been revealed",
                self.round_number
            )));
        }
        self.state = RoundState::Revealed;
        self.votes_revealed_at = Some(Timestamp::now());
        Ok(())
    }

    /// Validates that the round has been revealed and not yet finalized.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless the round is in REVEALED
    pub fn ensure_revealed(&self) -> Result<(), DomainError> {
        if self.state == RoundState::Revealed {
            Ok(())
        } else {
            Err(DomainError::InvalidState(format!(
                "Round {} must be revealed first",
                self.round_number
            )))
        }
    }

    /// Transitions REVEALED → FINALIZED (terminal).
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless the round is in REVEALED
    pub fn finalize(&mut self) -> Result<(), DomainError> {
        self.ensure_revealed()?;
        self.state = RoundState::Finalized;
        self.finalized_at = Some(Timestamp::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_round() -> Round {
        Round::new(RoundId::new(), ItemId::new(), 1)
    }

    #[test]
    fn new_round_is_voting() {
        let round = test_round();
        assert_eq!(round.state(), RoundState::Voting);
        assert!(round.votes_revealed_at().is_none());
        assert!(round.ensure_voting().is_ok());
    }

    #[test]
    fn reveal_transitions_to_revealed() {
        let mut round = test_round();
        round.reveal().unwrap();
        assert_eq!(round.state(), RoundState::Revealed);
        assert!(round.votes_revealed_at().is_some());
    }

    #[test]
    fn reveal_twice_fails() {
        let mut round = test_round();
        round.reveal().unwrap();
        assert!(matches!(round.reveal(), Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn ensure_voting_fails_after_reveal() {
        let mut round = test_round();
        round.reveal().unwrap();
        assert!(round.ensure_voting().is_err());
    }

    #[test]
    fn finalize_requires_reveal() {
        let mut round = test_round();
        assert!(matches!(
            round.finalize(),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn finalize_after_reveal_is_terminal() {
        let mut round = test_round();
        round.reveal().unwrap();
        round.finalize().unwrap();
        assert_eq!(round.state(), RoundState::Finalized);
        assert!(round.finalized_at().is_some());
        assert!(round.reveal().is_err());
        assert!(round.finalize().is_err());
    }
}
