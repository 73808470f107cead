//! Estimation authority - the single point of truth for all room state.
//!
//! Every operation validates its preconditions, mutates state under the
//! room's lock, and only then fans the resulting event out to subscribers.
//! A failed operation leaves all state unchanged and is reported to the
//! caller alone, never broadcast.

use std::sync::Arc;

use crate::domain::deck::DeckCatalog;
use crate::domain::foundation::{
    DomainError, ItemId, ParticipantId, RoomId, RoundId, VoteId,
};
use crate::domain::room::{
    Item, ItemSnapshot, Participant, ParticipantRole, RevealedVote, Room, RoomEvent, RoomSummary,
    Round, Vote, MAX_DISPLAY_NAME_LENGTH,
};
use crate::domain::statistics::{compute_statistics, VoteStatistics};
use crate::ports::NotificationSink;

use super::store::{RoomRecords, RoomStore};

/// Result of a successful room creation.
#[derive(Debug, Clone)]
pub struct CreatedRoom {
    pub room: Room,
    pub facilitator: Participant,
    pub share_link: String,
}

/// Voting progress for the current round of an item. Card values stay
/// hidden; only the counts travel.
#[derive(Debug, Clone, Copy)]
pub struct VoteProgress {
    pub item_id: ItemId,
    pub voted_count: u32,
    pub total_count: u32,
}

/// Result of revealing a round: each vote joined with its voter's display
/// name, plus the computed aggregates.
#[derive(Debug, Clone)]
pub struct RevealOutcome {
    pub item_id: ItemId,
    pub round_id: RoundId,
    pub votes: Vec<RevealedVote>,
    pub statistics: VoteStatistics,
}

/// Owns all mutable estimation state and enforces every transition.
///
/// Mutations serialize per room; see [`RoomStore`]. Fan-out through the
/// [`NotificationSink`] happens after the room lock is released and never
/// affects the operation result.
pub struct EstimationAuthority {
    store: RoomStore,
    sink: Arc<dyn NotificationSink>,
}

impl EstimationAuthority {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            store: RoomStore::new(),
            sink,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Room lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Creates a room, its facilitator participant, and its summary.
    ///
    /// The facilitator's display name is the room name (truncated to the
    /// display-name limit). Deck values are copied from the catalog so
    /// later catalog changes never affect this room.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` on name validation failure
    /// - `UnknownDeck` if the deck type is not registered
    pub async fn create_room(
        &self,
        name: &str,
        deck_type: &str,
        base_url: Option<&str>,
    ) -> Result<CreatedRoom, DomainError> {
        let deck_values = DeckCatalog::resolve(deck_type)?;

        let facilitator_id = ParticipantId::new();
        let room = Room::new(
            RoomId::new(),
            name,
            deck_type.to_string(),
            deck_values,
            facilitator_id,
        )?;

        let facilitator_name: String = room.name().chars().take(MAX_DISPLAY_NAME_LENGTH).collect();
        let facilitator = Participant::new(
            facilitator_id,
            *room.id(),
            &facilitator_name,
            ParticipantRole::Facilitator,
        )?;

        let share_link = match base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), room.share_path()),
            None => room.share_path(),
        };

        let created = CreatedRoom {
            room: room.clone(),
            facilitator: facilitator.clone(),
            share_link,
        };

        self.store.insert(RoomRecords::new(room, facilitator)).await;

        tracing::info!(room_id = %created.room.id(), deck_type, "room created");
        Ok(created)
    }

    /// Adds a participant or observer to an open room.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `RoomClosed`
    /// - `InvalidInput` on a bad display name, or when the facilitator
    ///   role is requested (it is only ever assigned at room creation)
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        display_name: &str,
        role: ParticipantRole,
    ) -> Result<Participant, DomainError> {
        if role == ParticipantRole::Facilitator {
            return Err(DomainError::invalid_input(
                "role",
                "The facilitator role cannot be joined",
            ));
        }

        let handle = self.store.get(room_id).await?;
        let (participant, event) = {
            let mut records = handle.lock().await;
            records.room().ensure_open()?;

            let participant =
                Participant::new(ParticipantId::new(), *room_id, display_name, role)?;
            records.insert_participant(participant.clone());
            records.summary_mut().record_join();

            (participant.clone(), RoomEvent::participant_joined(&participant))
        };

        self.sink.publish(room_id, event).await;
        Ok(participant)
    }

    /// Marks a participant as having left. Idempotent: leaving twice is a
    /// no-op, not an error.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`
    /// - `ParticipantNotFound` if the participant does not exist in this room
    pub async fn leave_room(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
    ) -> Result<(), DomainError> {
        let handle = self.store.get(room_id).await?;
        let event = {
            let mut records = handle.lock().await;
            let participant = records
                .participant_mut(participant_id)
                .ok_or(DomainError::ParticipantNotFound(*participant_id))?;

            if !participant.leave() {
                None
            } else {
                Some(RoomEvent::ParticipantLeft {
                    participant_id: *participant.id(),
                    display_name: participant.display_name().to_string(),
                })
            }
        };

        if let Some(event) = event {
            self.sink.publish(room_id, event).await;
        }
        Ok(())
    }

    /// Closes the room. Idempotent on an already-closed room.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`
    /// - `Forbidden` if the caller is not the facilitator
    pub async fn close_room(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
    ) -> Result<Room, DomainError> {
        let handle = self.store.get(room_id).await?;
        let (room, event) = {
            let mut records = handle.lock().await;
            records.room().ensure_facilitator(participant_id)?;

            let newly_closed = records.room_mut().close();
            if newly_closed {
                records.summary_mut().mark_closed();
            }
            let room = records.room().clone();
            let event = if newly_closed {
                room.closed_at()
                    .map(|ts| RoomEvent::RoomClosed { closed_at: *ts })
            } else {
                None
            };
            (room, event)
        };

        if let Some(event) = event {
            self.sink.publish(room_id, event).await;
        }
        Ok(room)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Items
    // ─────────────────────────────────────────────────────────────────────

    /// Adds an item with a fresh first voting round.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `RoomClosed`
    /// - `Forbidden` if the caller is not the facilitator
    /// - `InvalidInput` on title/description validation failure
    pub async fn add_item(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        title: &str,
        description: Option<String>,
    ) -> Result<Item, DomainError> {
        let handle = self.store.get(room_id).await?;
        let (item, event) = {
            let mut records = handle.lock().await;
            records.room().ensure_open()?;
            records.room().ensure_facilitator(participant_id)?;

            let item_id = ItemId::new();
            let round_id = RoundId::new();
            let order = records.next_item_order();
            let item = Item::new(item_id, *room_id, title, description, order, round_id)?;

            records.insert_round(Round::new(round_id, item_id, 1));
            records.insert_item(item.clone());

            let event = RoomEvent::ItemAdded {
                item: ItemSnapshot::from(&item),
            };
            (item, event)
        };

        self.sink.publish(room_id, event).await;
        Ok(item)
    }

    /// Applies the provided item fields. Disallowed once voting has
    /// started in the item's current round.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `Forbidden`, `ItemNotFound`
    /// - `InvalidState` if the current round already has votes
    /// - `InvalidInput` on validation failure of a provided field
    pub async fn update_item(
        &self,
        room_id: &RoomId,
        item_id: &ItemId,
        participant_id: &ParticipantId,
        title: Option<&str>,
        description: Option<String>,
    ) -> Result<Item, DomainError> {
        let handle = self.store.get(room_id).await?;
        let (item, event) = {
            let mut records = handle.lock().await;
            records.room().ensure_facilitator(participant_id)?;

            let current_round_id = records.item(item_id)?.current_round_id().copied();
            if let Some(round_id) = current_round_id {
                if records.vote_count_for_round(&round_id) > 0 {
                    return Err(DomainError::InvalidState(
                        "Item cannot be edited after voting has started".to_string(),
                    ));
                }
            }

            let item = records.item_mut(item_id)?;
            item.update(title, description)?;
            let item = item.clone();

            let event = RoomEvent::ItemUpdated {
                item: ItemSnapshot::from(&item),
            };
            (item, event)
        };

        self.sink.publish(room_id, event).await;
        Ok(item)
    }

    /// Removes an item and cascades to all of its rounds and votes.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `Forbidden`, `ItemNotFound`
    pub async fn remove_item(
        &self,
        room_id: &RoomId,
        item_id: &ItemId,
        participant_id: &ParticipantId,
    ) -> Result<(), DomainError> {
        let handle = self.store.get(room_id).await?;
        {
            let mut records = handle.lock().await;
            records.room().ensure_facilitator(participant_id)?;
            records.remove_item_cascade(item_id)?;
        }

        self.sink
            .publish(room_id, RoomEvent::ItemRemoved { item_id: *item_id })
            .await;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Voting
    // ─────────────────────────────────────────────────────────────────────

    /// Upserts the participant's vote for the item's current round.
    /// Re-casting while the round is VOTING overwrites the previous
    /// selection; a round that has been revealed rejects the vote.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `RoomClosed`, `ParticipantNotFound`
    /// - `Forbidden` for observers
    /// - `ItemNotFound`, `NoActiveRound`, `RoundNotFound`
    /// - `InvalidState` if the round is no longer VOTING
    /// - `InvalidInput` if the card value is not in the room's deck
    pub async fn cast_vote(
        &self,
        room_id: &RoomId,
        item_id: &ItemId,
        participant_id: &ParticipantId,
        card_value: &str,
    ) -> Result<VoteProgress, DomainError> {
        let handle = self.store.get(room_id).await?;
        let progress = {
            let mut records = handle.lock().await;
            records.room().ensure_open()?;

            let participant = records.active_participant(participant_id)?;
            if !participant.role().can_vote() {
                return Err(DomainError::Forbidden(
                    "Observers cannot cast votes".to_string(),
                ));
            }

            let item = records.item(item_id)?;
            let round_id = *item
                .current_round_id()
                .ok_or(DomainError::NoActiveRound(*item_id))?;
            records.round(&round_id)?.ensure_voting()?;

            if !records.room().allows_card(card_value) {
                return Err(DomainError::invalid_input(
                    "card_value",
                    format!("'{}' is not in this room's deck", card_value),
                ));
            }

            match records.vote_for(&round_id, participant_id) {
                Some(vote) => vote.recast(card_value.to_string()),
                None => records.insert_vote(Vote::new(
                    VoteId::new(),
                    round_id,
                    *participant_id,
                    card_value.to_string(),
                )),
            }

            VoteProgress {
                item_id: *item_id,
                voted_count: records.vote_count_for_round(&round_id),
                total_count: records.eligible_voter_count(),
            }
        };

        self.sink
            .publish(
                room_id,
                RoomEvent::VoteCountChanged {
                    item_id: progress.item_id,
                    voted_count: progress.voted_count,
                    total_count: progress.total_count,
                },
            )
            .await;
        Ok(progress)
    }

    /// Reveals the current round: flips every vote visible and computes
    /// the aggregates. Exactly one of two racing reveals wins; the loser
    /// observes the REVEALED state and fails.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `Forbidden`, `ItemNotFound`, `NoActiveRound`,
    ///   `RoundNotFound`
    /// - `InvalidState` if the round is not in VOTING
    pub async fn reveal_votes(
        &self,
        room_id: &RoomId,
        item_id: &ItemId,
        participant_id: &ParticipantId,
    ) -> Result<RevealOutcome, DomainError> {
        let handle = self.store.get(room_id).await?;
        let outcome = {
            let mut records = handle.lock().await;
            records.room().ensure_facilitator(participant_id)?;

            let item = records.item(item_id)?;
            let round_id = *item
                .current_round_id()
                .ok_or(DomainError::NoActiveRound(*item_id))?;

            records.round_mut(&round_id)?.reveal()?;
            records.reveal_votes_in_round(&round_id);

            let votes: Vec<RevealedVote> = records
                .votes_for_round(&round_id)
                .into_iter()
                .map(|vote| RevealedVote {
                    participant_id: *vote.participant_id(),
                    display_name: records
                        .participant(vote.participant_id())
                        .map(|p| p.display_name().to_string())
                        .unwrap_or_default(),
                    card_value: vote.card_value().to_string(),
                })
                .collect();

            let card_values: Vec<String> =
                votes.iter().map(|v| v.card_value.clone()).collect();
            let statistics = compute_statistics(&card_values, records.room().deck_values());

            RevealOutcome {
                item_id: *item_id,
                round_id,
                votes,
                statistics,
            }
        };

        self.sink
            .publish(
                room_id,
                RoomEvent::VotesRevealed {
                    item_id: outcome.item_id,
                    votes: outcome.votes.clone(),
                    statistics: outcome.statistics.clone(),
                },
            )
            .await;
        Ok(outcome)
    }

    /// Starts a fresh voting round after a reveal. The previous round and
    /// its votes remain stored and queryable but are no longer current.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `Forbidden`, `ItemNotFound`, `NoActiveRound`,
    ///   `RoundNotFound`
    /// - `InvalidState` unless the current round is in REVEALED
    pub async fn start_revote(
        &self,
        room_id: &RoomId,
        item_id: &ItemId,
        participant_id: &ParticipantId,
    ) -> Result<Round, DomainError> {
        let handle = self.store.get(room_id).await?;
        let round = {
            let mut records = handle.lock().await;
            records.room().ensure_facilitator(participant_id)?;

            let item = records.item(item_id)?;
            let round_id = *item
                .current_round_id()
                .ok_or(DomainError::NoActiveRound(*item_id))?;

            let previous = records.round(&round_id)?;
            previous.ensure_revealed()?;
            let next_number = previous.round_number() + 1;

            let round = Round::new(RoundId::new(), *item_id, next_number);
            records.item_mut(item_id)?.point_to_round(*round.id());
            records.insert_round(round.clone());
            round
        };

        self.sink
            .publish(
                room_id,
                RoomEvent::RevoteStarted {
                    item_id: *item_id,
                    round_number: round.round_number(),
                },
            )
            .await;
        Ok(round)
    }

    /// Records the facilitator-confirmed estimate on an item, finalizing
    /// its current round and ending estimation for the item.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound`, `Forbidden`, `ItemNotFound`
    /// - `InvalidInput` if the card value is not in the room's deck
    /// - `NoActiveRound` if the item was already finalized
    /// - `RoundNotFound`
    /// - `InvalidState` unless the current round is in REVEALED
    pub async fn record_final_estimate(
        &self,
        room_id: &RoomId,
        item_id: &ItemId,
        participant_id: &ParticipantId,
        card_value: &str,
    ) -> Result<Item, DomainError> {
        let handle = self.store.get(room_id).await?;
        let item = {
            let mut records = handle.lock().await;
            records.room().ensure_facilitator(participant_id)?;

            let item = records.item(item_id)?;
            if !records.room().allows_card(card_value) {
                return Err(DomainError::invalid_input(
                    "card_value",
                    format!("'{}' is not in this room's deck", card_value),
                ));
            }
            let round_id = *item
                .current_round_id()
                .ok_or(DomainError::NoActiveRound(*item_id))?;

            records.round_mut(&round_id)?.finalize()?;
            records
                .item_mut(item_id)?
                .record_final_estimate(card_value.to_string());

            let estimated = records.finalized_item_count();
            records.summary_mut().set_items_estimated(estimated);

            records.item(item_id)?.clone()
        };

        self.sink
            .publish(
                room_id,
                RoomEvent::FinalEstimateRecorded {
                    item: ItemSnapshot::from(&item),
                    final_estimate: card_value.to_string(),
                },
            )
            .await;
        Ok(item)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub async fn get_room(&self, room_id: &RoomId) -> Result<Room, DomainError> {
        let handle = self.store.get(room_id).await?;
        let records = handle.lock().await;
        Ok(records.room().clone())
    }

    pub async fn get_summary(&self, room_id: &RoomId) -> Result<RoomSummary, DomainError> {
        let handle = self.store.get(room_id).await?;
        let records = handle.lock().await;
        Ok(records.summary().clone())
    }

    /// Active participants of a room, ordered by join time.
    pub async fn get_active_participants(
        &self,
        room_id: &RoomId,
    ) -> Result<Vec<Participant>, DomainError> {
        let handle = self.store.get(room_id).await?;
        let records = handle.lock().await;
        Ok(records
            .active_participants()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Items of a room, ordered by their order value.
    pub async fn get_items(&self, room_id: &RoomId) -> Result<Vec<Item>, DomainError> {
        let handle = self.store.get(room_id).await?;
        let records = handle.lock().await;
        Ok(records.items_ordered().into_iter().cloned().collect())
    }

    pub async fn get_round(
        &self,
        room_id: &RoomId,
        round_id: &RoundId,
    ) -> Result<Round, DomainError> {
        let handle = self.store.get(room_id).await?;
        let records = handle.lock().await;
        Ok(records.round(round_id)?.clone())
    }

    pub async fn get_votes_by_round(
        &self,
        room_id: &RoomId,
        round_id: &RoundId,
    ) -> Result<Vec<Vote>, DomainError> {
        let handle = self.store.get(room_id).await?;
        let records = handle.lock().await;
        records.round(round_id)?;
        Ok(records
            .votes_for_round(round_id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn vote_count_for_round(
        &self,
        room_id: &RoomId,
        round_id: &RoundId,
    ) -> Result<u32, DomainError> {
        let handle = self.store.get(room_id).await?;
        let records = handle.lock().await;
        records.round(round_id)?;
        Ok(records.vote_count_for_round(round_id))
    }

    /// Active participants whose role may vote.
    pub async fn eligible_voter_count(&self, room_id: &RoomId) -> Result<u32, DomainError> {
        let handle = self.store.get(room_id).await?;
        let records = handle.lock().await;
        Ok(records.eligible_voter_count())
    }

    /// Whether the participant is active in this room. Used by the
    /// boundary to admit event subscriptions.
    pub async fn is_active_participant(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
    ) -> Result<bool, DomainError> {
        let handle = self.store.get(room_id).await?;
        let records = handle.lock().await;
        Ok(records.active_participant(participant_id).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every published event for assertions.
    struct RecordingSink {
        events: Mutex<Vec<(RoomId, RoomEvent)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        fn events(&self) -> Vec<(RoomId, RoomEvent)> {
            self.events.lock().unwrap().clone()
        }

        fn event_names(&self) -> Vec<&'static str> {
            self.events()
                .into_iter()
                .map(|(_, event)| event.name())
                .collect()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn publish(&self, room_id: &RoomId, event: RoomEvent) {
            self.events.lock().unwrap().push((*room_id, event));
        }
    }

    fn authority() -> (EstimationAuthority, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        (EstimationAuthority::new(sink.clone()), sink)
    }

    async fn room_with_item(
        authority: &EstimationAuthority,
    ) -> (RoomId, ParticipantId, ItemId) {
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let room_id = *created.room.id();
        let facilitator_id = *created.facilitator.id();
        let item = authority
            .add_item(&room_id, &facilitator_id, "Login page", None)
            .await
            .unwrap();
        (room_id, facilitator_id, *item.id())
    }

    // Room creation

    #[tokio::test]
    async fn create_room_has_exactly_one_participant() {
        let (authority, _) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();

        let participants = authority
            .get_active_participants(created.room.id())
            .await
            .unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].role(), ParticipantRole::Facilitator);
        assert_eq!(participants[0].display_name(), "Sprint 1");
    }

    #[tokio::test]
    async fn create_room_copies_deck_values_from_catalog() {
        let (authority, _) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();

        let expected = DeckCatalog::resolve("FIBONACCI").unwrap();
        assert_eq!(created.room.deck_values(), expected.as_slice());
    }

    #[tokio::test]
    async fn create_room_rejects_unknown_deck() {
        let (authority, _) = authority();
        let result = authority.create_room("Sprint 1", "POWERS_OF_TWO", None).await;
        assert!(matches!(result, Err(DomainError::UnknownDeck(_))));
    }

    #[tokio::test]
    async fn create_room_builds_share_link_from_base_url() {
        let (authority, _) = authority();
        let created = authority
            .create_room("Sprint 1", "LINEAR", Some("https://poker.example.com/"))
            .await
            .unwrap();
        assert_eq!(
            created.share_link,
            format!("https://poker.example.com/room/{}", created.room.id())
        );
    }

    #[tokio::test]
    async fn create_room_truncates_long_facilitator_name() {
        let (authority, _) = authority();
        let long_name = "x".repeat(150);
        let created = authority
            .create_room(&long_name, "LINEAR", None)
            .await
            .unwrap();
        assert_eq!(created.facilitator.display_name().chars().count(), 100);
        assert_eq!(created.room.name().chars().count(), 150);
    }

    // Join / leave

    #[tokio::test]
    async fn join_room_adds_active_participant_and_publishes() {
        let (authority, sink) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let room_id = *created.room.id();

        let participant = authority
            .join_room(&room_id, "Alex", ParticipantRole::Participant)
            .await
            .unwrap();

        assert!(participant.is_active());
        assert_eq!(
            authority.get_summary(&room_id).await.unwrap().total_participants(),
            2
        );
        assert_eq!(sink.event_names(), vec!["participant_joined"]);
    }

    #[tokio::test]
    async fn join_room_never_assigns_facilitator_role() {
        let (authority, _) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();

        let result = authority
            .join_room(created.room.id(), "Alex", ParticipantRole::Facilitator)
            .await;
        assert!(matches!(result, Err(DomainError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn join_closed_room_fails() {
        let (authority, _) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let room_id = *created.room.id();
        authority
            .close_room(&room_id, created.facilitator.id())
            .await
            .unwrap();

        let result = authority
            .join_room(&room_id, "Alex", ParticipantRole::Participant)
            .await;
        assert!(matches!(result, Err(DomainError::RoomClosed(_))));
    }

    #[tokio::test]
    async fn join_unknown_room_fails() {
        let (authority, _) = authority();
        let result = authority
            .join_room(&RoomId::new(), "Alex", ParticipantRole::Participant)
            .await;
        assert!(matches!(result, Err(DomainError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn leave_room_is_idempotent() {
        let (authority, sink) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let room_id = *created.room.id();
        let participant = authority
            .join_room(&room_id, "Alex", ParticipantRole::Participant)
            .await
            .unwrap();

        authority.leave_room(&room_id, participant.id()).await.unwrap();
        authority.leave_room(&room_id, participant.id()).await.unwrap();

        let names = sink.event_names();
        assert_eq!(
            names.iter().filter(|n| **n == "participant_left").count(),
            1
        );
        assert_eq!(
            authority.get_active_participants(&room_id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn leave_room_unknown_participant_fails() {
        let (authority, _) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let result = authority
            .leave_room(created.room.id(), &ParticipantId::new())
            .await;
        assert!(matches!(result, Err(DomainError::ParticipantNotFound(_))));
    }

    // Close

    #[tokio::test]
    async fn close_room_requires_facilitator() {
        let (authority, _) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let room_id = *created.room.id();
        let participant = authority
            .join_room(&room_id, "Alex", ParticipantRole::Participant)
            .await
            .unwrap();

        let result = authority.close_room(&room_id, participant.id()).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn close_room_twice_publishes_once() {
        let (authority, sink) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let room_id = *created.room.id();
        let facilitator_id = *created.facilitator.id();

        authority.close_room(&room_id, &facilitator_id).await.unwrap();
        authority.close_room(&room_id, &facilitator_id).await.unwrap();

        assert_eq!(
            sink.event_names()
                .iter()
                .filter(|n| **n == "room_closed")
                .count(),
            1
        );
        assert!(authority
            .get_summary(&room_id)
            .await
            .unwrap()
            .closed_at()
            .is_some());
    }

    // Items

    #[tokio::test]
    async fn add_item_starts_round_one() {
        let (authority, _) = authority();
        let (room_id, _, item_id) = room_with_item(&authority).await;

        let items = authority.get_items(&room_id).await.unwrap();
        assert_eq!(items.len(), 1);
        let round_id = *items[0].current_round_id().unwrap();
        let round = authority.get_round(&room_id, &round_id).await.unwrap();
        assert_eq!(round.round_number(), 1);
        assert_eq!(round.item_id(), &item_id);
    }

    #[tokio::test]
    async fn add_item_requires_facilitator() {
        let (authority, _) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let room_id = *created.room.id();
        let participant = authority
            .join_room(&room_id, "Alex", ParticipantRole::Participant)
            .await
            .unwrap();

        let result = authority
            .add_item(&room_id, participant.id(), "Login page", None)
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn item_orders_strictly_increase_and_are_never_reused() {
        let (authority, _) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let room_id = *created.room.id();
        let facilitator_id = *created.facilitator.id();

        let first = authority
            .add_item(&room_id, &facilitator_id, "One", None)
            .await
            .unwrap();
        let second = authority
            .add_item(&room_id, &facilitator_id, "Two", None)
            .await
            .unwrap();
        assert_eq!(first.order(), 1);
        assert_eq!(second.order(), 2);

        authority
            .remove_item(&room_id, second.id(), &facilitator_id)
            .await
            .unwrap();
        let third = authority
            .add_item(&room_id, &facilitator_id, "Three", None)
            .await
            .unwrap();
        assert_eq!(third.order(), 3);
    }

    #[tokio::test]
    async fn update_item_blocked_after_first_vote() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;

        authority
            .update_item(&room_id, &item_id, &facilitator_id, Some("Signup"), None)
            .await
            .unwrap();

        authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "5")
            .await
            .unwrap();

        let result = authority
            .update_item(&room_id, &item_id, &facilitator_id, Some("Other"), None)
            .await;
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[tokio::test]
    async fn remove_item_cascades_rounds_and_votes() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;
        let items = authority.get_items(&room_id).await.unwrap();
        let round_id = *items[0].current_round_id().unwrap();

        authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "5")
            .await
            .unwrap();
        authority
            .remove_item(&room_id, &item_id, &facilitator_id)
            .await
            .unwrap();

        assert!(authority.get_items(&room_id).await.unwrap().is_empty());
        assert!(matches!(
            authority.get_round(&room_id, &round_id).await,
            Err(DomainError::RoundNotFound(_))
        ));
        assert!(matches!(
            authority.get_votes_by_round(&room_id, &round_id).await,
            Err(DomainError::RoundNotFound(_))
        ));
    }

    // Voting

    #[tokio::test]
    async fn cast_vote_upserts_by_participant() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;
        let items = authority.get_items(&room_id).await.unwrap();
        let round_id = *items[0].current_round_id().unwrap();

        authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "3")
            .await
            .unwrap();
        let progress = authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "8")
            .await
            .unwrap();

        assert_eq!(progress.voted_count, 1);
        let votes = authority
            .get_votes_by_round(&room_id, &round_id)
            .await
            .unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].card_value(), "8");
    }

    #[tokio::test]
    async fn cast_vote_rejects_observers() {
        let (authority, _) = authority();
        let (room_id, _, item_id) = room_with_item(&authority).await;
        let observer = authority
            .join_room(&room_id, "Watcher", ParticipantRole::Observer)
            .await
            .unwrap();

        let result = authority
            .cast_vote(&room_id, &item_id, observer.id(), "5")
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn cast_vote_rejects_values_outside_deck() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;

        let result = authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "4")
            .await;
        assert!(matches!(result, Err(DomainError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn cast_vote_rejects_inactive_participant() {
        let (authority, _) = authority();
        let (room_id, _, item_id) = room_with_item(&authority).await;
        let participant = authority
            .join_room(&room_id, "Alex", ParticipantRole::Participant)
            .await
            .unwrap();
        authority.leave_room(&room_id, participant.id()).await.unwrap();

        let result = authority
            .cast_vote(&room_id, &item_id, participant.id(), "5")
            .await;
        assert!(matches!(result, Err(DomainError::ParticipantNotFound(_))));
    }

    #[tokio::test]
    async fn cast_vote_after_reveal_fails() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;

        authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "5")
            .await
            .unwrap();
        authority
            .reveal_votes(&room_id, &item_id, &facilitator_id)
            .await
            .unwrap();

        let result = authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "8")
            .await;
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[tokio::test]
    async fn vote_progress_reports_eligible_counts() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;
        authority
            .join_room(&room_id, "Alex", ParticipantRole::Participant)
            .await
            .unwrap();
        authority
            .join_room(&room_id, "Watcher", ParticipantRole::Observer)
            .await
            .unwrap();

        let progress = authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "5")
            .await
            .unwrap();

        // Observer excluded from the total.
        assert_eq!(progress.voted_count, 1);
        assert_eq!(progress.total_count, 2);
    }

    // Reveal / revote / finalize

    #[tokio::test]
    async fn reveal_joins_votes_with_display_names() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;
        let alex = authority
            .join_room(&room_id, "Alex", ParticipantRole::Participant)
            .await
            .unwrap();

        authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "3")
            .await
            .unwrap();
        authority
            .cast_vote(&room_id, &item_id, alex.id(), "5")
            .await
            .unwrap();

        let outcome = authority
            .reveal_votes(&room_id, &item_id, &facilitator_id)
            .await
            .unwrap();

        assert_eq!(outcome.votes.len(), 2);
        assert!(outcome.votes.iter().any(|v| v.display_name == "Alex"));
        assert_eq!(outcome.statistics.average, 4.0);
        assert_eq!(outcome.statistics.distribution.get("3"), Some(&1));
        assert_eq!(outcome.statistics.distribution.get("5"), Some(&1));
    }

    #[tokio::test]
    async fn reveal_marks_every_vote_revealed() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;
        authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "5")
            .await
            .unwrap();

        let outcome = authority
            .reveal_votes(&room_id, &item_id, &facilitator_id)
            .await
            .unwrap();

        let votes = authority
            .get_votes_by_round(&room_id, &outcome.round_id)
            .await
            .unwrap();
        assert!(votes.iter().all(|v| v.is_revealed()));
    }

    #[tokio::test]
    async fn reveal_twice_fails_with_invalid_state() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;

        authority
            .reveal_votes(&room_id, &item_id, &facilitator_id)
            .await
            .unwrap();
        let result = authority
            .reveal_votes(&room_id, &item_id, &facilitator_id)
            .await;
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[tokio::test]
    async fn revote_starts_fresh_round_and_keeps_old_votes() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;
        authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "5")
            .await
            .unwrap();
        let outcome = authority
            .reveal_votes(&room_id, &item_id, &facilitator_id)
            .await
            .unwrap();

        let new_round = authority
            .start_revote(&room_id, &item_id, &facilitator_id)
            .await
            .unwrap();

        assert_eq!(new_round.round_number(), 2);
        assert_eq!(
            authority
                .vote_count_for_round(&room_id, new_round.id())
                .await
                .unwrap(),
            0
        );
        // Prior round's votes remain queryable by their original round id.
        let old_votes = authority
            .get_votes_by_round(&room_id, &outcome.round_id)
            .await
            .unwrap();
        assert_eq!(old_votes.len(), 1);
    }

    #[tokio::test]
    async fn revote_before_reveal_fails() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;

        let result = authority
            .start_revote(&room_id, &item_id, &facilitator_id)
            .await;
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[tokio::test]
    async fn finalize_requires_prior_reveal() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;

        let result = authority
            .record_final_estimate(&room_id, &item_id, &facilitator_id, "5")
            .await;
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[tokio::test]
    async fn finalize_records_estimate_and_ends_estimation() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;
        let items = authority.get_items(&room_id).await.unwrap();
        let round_id = *items[0].current_round_id().unwrap();

        authority
            .cast_vote(&room_id, &item_id, &facilitator_id, "5")
            .await
            .unwrap();
        authority
            .reveal_votes(&room_id, &item_id, &facilitator_id)
            .await
            .unwrap();
        let item = authority
            .record_final_estimate(&room_id, &item_id, &facilitator_id, "5")
            .await
            .unwrap();

        assert_eq!(item.final_estimate(), Some("5"));
        assert!(item.current_round_id().is_none());
        let round = authority.get_round(&room_id, &round_id).await.unwrap();
        assert_eq!(round.state(), crate::domain::room::RoundState::Finalized);
        assert_eq!(
            authority
                .get_summary(&room_id)
                .await
                .unwrap()
                .total_items_estimated(),
            1
        );
    }

    #[tokio::test]
    async fn finalize_twice_fails() {
        let (authority, _) = authority();
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;

        authority
            .reveal_votes(&room_id, &item_id, &facilitator_id)
            .await
            .unwrap();
        authority
            .record_final_estimate(&room_id, &item_id, &facilitator_id, "5")
            .await
            .unwrap();

        let result = authority
            .record_final_estimate(&room_id, &item_id, &facilitator_id, "8")
            .await;
        assert!(matches!(result, Err(DomainError::NoActiveRound(_))));
    }

    // End-to-end scenario

    #[tokio::test]
    async fn end_to_end_estimation_flow() {
        let (authority, sink) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let room_id = *created.room.id();
        let facilitator_id = *created.facilitator.id();

        let item = authority
            .add_item(&room_id, &facilitator_id, "Login page", None)
            .await
            .unwrap();
        let item_id = *item.id();

        let alice = authority
            .join_room(&room_id, "Alice", ParticipantRole::Participant)
            .await
            .unwrap();
        let bob = authority
            .join_room(&room_id, "Bob", ParticipantRole::Participant)
            .await
            .unwrap();

        authority
            .cast_vote(&room_id, &item_id, alice.id(), "3")
            .await
            .unwrap();
        authority
            .cast_vote(&room_id, &item_id, bob.id(), "5")
            .await
            .unwrap();

        let outcome = authority
            .reveal_votes(&room_id, &item_id, &facilitator_id)
            .await
            .unwrap();
        assert_eq!(outcome.statistics.average, 4.0);
        assert_eq!(outcome.statistics.distribution.len(), 2);

        let finalized = authority
            .record_final_estimate(&room_id, &item_id, &facilitator_id, "5")
            .await
            .unwrap();
        assert_eq!(finalized.final_estimate(), Some("5"));

        let names = sink.event_names();
        assert!(names.contains(&"item_added"));
        assert!(names.contains(&"votes_revealed"));
        assert!(names.contains(&"final_estimate_recorded"));
    }

    // Concurrency

    #[tokio::test]
    async fn concurrent_votes_from_distinct_participants_all_apply() {
        let (authority, _) = authority();
        let authority = Arc::new(authority);
        let (room_id, _, item_id) = room_with_item(&authority).await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let participant = authority
                .join_room(&room_id, &format!("P{}", i), ParticipantRole::Participant)
                .await
                .unwrap();
            let authority = authority.clone();
            handles.push(tokio::spawn(async move {
                authority
                    .cast_vote(&room_id, &item_id, participant.id(), "5")
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let items = authority.get_items(&room_id).await.unwrap();
        let round_id = *items[0].current_round_id().unwrap();
        assert_eq!(
            authority
                .vote_count_for_round(&room_id, &round_id)
                .await
                .unwrap(),
            8
        );
    }

    #[tokio::test]
    async fn racing_reveals_have_exactly_one_winner() {
        let (authority, _) = authority();
        let authority = Arc::new(authority);
        let (room_id, facilitator_id, item_id) = room_with_item(&authority).await;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let authority = authority.clone();
            handles.push(tokio::spawn(async move {
                authority
                    .reveal_votes(&room_id, &item_id, &facilitator_id)
                    .await
            }));
        }

        let mut wins = 0;
        let mut state_errors = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(DomainError::InvalidState(_)) => state_errors += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(state_errors, 3);
    }

    #[tokio::test]
    async fn is_active_participant_reflects_membership() {
        let (authority, _) = authority();
        let created = authority
            .create_room("Sprint 1", "FIBONACCI", None)
            .await
            .unwrap();
        let room_id = *created.room.id();
        let participant = authority
            .join_room(&room_id, "Alex", ParticipantRole::Participant)
            .await
            .unwrap();

        assert!(authority
            .is_active_participant(&room_id, participant.id())
            .await
            .unwrap());

        authority.leave_room(&room_id, participant.id()).await.unwrap();
        assert!(!authority
            .is_active_participant(&room_id, participant.id())
            .await
            .unwrap());
    }
}
