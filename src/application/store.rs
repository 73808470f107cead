//! In-memory state container for the estimation authority.
//!
//! All entity collections live here, keyed by id and scoped per room. The
//! registry hands out one `Arc<Mutex<RoomRecords>>` per room so that
//! mutating operations serialize per room while operations on different
//! rooms proceed fully in parallel. No operation spans multiple rooms, so
//! the coarse per-room lock introduces no deadlock risk.
//!
//! Nothing is persisted; process restart loses all rooms by design.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::{
    DomainError, ItemId, ParticipantId, RoomId, RoundId, VoteId,
};
use crate::domain::room::{Item, Participant, Room, RoomSummary, Round, Vote};

/// Every record belonging to one room.
pub struct RoomRecords {
    room: Room,
    summary: RoomSummary,
    participants: HashMap<ParticipantId, Participant>,
    items: HashMap<ItemId, Item>,
    rounds: HashMap<RoundId, Round>,
    votes: HashMap<VoteId, Vote>,
    /// High-water mark for item order. Orders strictly increase and are
    /// never reused, even after the highest-ordered item is removed.
    last_item_order: u32,
}

impl RoomRecords {
    /// Creates the records for a fresh room with its facilitator.
    pub fn new(room: Room, facilitator: Participant) -> Self {
        let summary = RoomSummary::new(*room.id());
        let mut participants = HashMap::new();
        participants.insert(*facilitator.id(), facilitator);

        Self {
            room,
            summary,
            participants,
            items: HashMap::new(),
            rounds: HashMap::new(),
            votes: HashMap::new(),
            last_item_order: 0,
        }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn room_mut(&mut self) -> &mut Room {
        &mut self.room
    }

    pub fn summary(&self) -> &RoomSummary {
        &self.summary
    }

    pub fn summary_mut(&mut self) -> &mut RoomSummary {
        &mut self.summary
    }

    // ─────────────────────────────────────────────────────────────────────
    // Participants
    // ─────────────────────────────────────────────────────────────────────

    pub fn insert_participant(&mut self, participant: Participant) {
        self.participants.insert(*participant.id(), participant);
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn participant_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(id)
    }

    /// Resolves a participant that must be active in this room.
    ///
    /// # Errors
    ///
    /// - `ParticipantNotFound` if missing or inactive
    pub fn active_participant(&self, id: &ParticipantId) -> Result<&Participant, DomainError> {
        self.participants
            .get(id)
            .filter(|p| p.is_active())
            .ok_or(DomainError::ParticipantNotFound(*id))
    }

    /// Active participants ordered by join time.
    pub fn active_participants(&self) -> Vec<&Participant> {
        let mut active: Vec<&Participant> = self
            .participants
            .values()
            .filter(|p| p.is_active())
            .collect();
        active.sort_by_key(|p| (*p.joined_at(), *p.id()));
        active
    }

    /// Active participants whose role may cast votes.
    pub fn eligible_voter_count(&self) -> u32 {
        self.participants
            .values()
            .filter(|p| p.is_active() && p.role().can_vote())
            .count() as u32
    }

    // ─────────────────────────────────────────────────────────────────────
    // Items
    // ─────────────────────────────────────────────────────────────────────

    /// Next order value; strictly increasing, never reused.
    pub fn next_item_order(&mut self) -> u32 {
        self.last_item_order += 1;
        self.last_item_order
    }

    pub fn insert_item(&mut self, item: Item) {
        self.items.insert(*item.id(), item);
    }

    pub fn item(&self, id: &ItemId) -> Result<&Item, DomainError> {
        self.items.get(id).ok_or(DomainError::ItemNotFound(*id))
    }

    pub fn item_mut(&mut self, id: &ItemId) -> Result<&mut Item, DomainError> {
        self.items.get_mut(id).ok_or(DomainError::ItemNotFound(*id))
    }

    /// Items ordered by their order value.
    pub fn items_ordered(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.values().collect();
        items.sort_by_key(|i| i.order());
        items
    }

    /// Count of items carrying a final estimate.
    pub fn finalized_item_count(&self) -> u32 {
        self.items.values().filter(|i| i.is_finalized()).count() as u32
    }

    /// Removes an item together with all of its rounds and their votes.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if the item does not exist
    pub fn remove_item_cascade(&mut self, id: &ItemId) -> Result<Item, DomainError> {
        let item = self.items.remove(id).ok_or(DomainError::ItemNotFound(*id))?;

        let round_ids: Vec<RoundId> = self
            .rounds
            .values()
            .filter(|r| r.item_id() == id)
            .map(|r| *r.id())
            .collect();
        for round_id in &round_ids {
            self.rounds.remove(round_id);
            self.votes.retain(|_, v| v.round_id() != round_id);
        }

        Ok(item)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rounds
    // ─────────────────────────────────────────────────────────────────────

    pub fn insert_round(&mut self, round: Round) {
        self.rounds.insert(*round.id(), round);
    }

    pub fn round(&self, id: &RoundId) -> Result<&Round, DomainError> {
        self.rounds.get(id).ok_or(DomainError::RoundNotFound(*id))
    }

    pub fn round_mut(&mut self, id: &RoundId) -> Result<&mut Round, DomainError> {
        self.rounds
            .get_mut(id)
            .ok_or(DomainError::RoundNotFound(*id))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Votes
    // ─────────────────────────────────────────────────────────────────────

    pub fn insert_vote(&mut self, vote: Vote) {
        self.votes.insert(*vote.id(), vote);
    }

    /// The participant's vote in a round, if any.
    pub fn vote_for(
        &mut self,
        round_id: &RoundId,
        participant_id: &ParticipantId,
    ) -> Option<&mut Vote> {
        self.votes
            .values_mut()
            .find(|v| v.round_id() == round_id && v.participant_id() == participant_id)
    }

    /// Votes of one round, ordered by cast time.
    pub fn votes_for_round(&self, round_id: &RoundId) -> Vec<&Vote> {
        let mut votes: Vec<&Vote> = self
            .votes
            .values()
            .filter(|v| v.round_id() == round_id)
            .collect();
        votes.sort_by_key(|v| (*v.voted_at(), *v.id()));
        votes
    }

    pub fn vote_count_for_round(&self, round_id: &RoundId) -> u32 {
        self.votes
            .values()
            .filter(|v| v.round_id() == round_id)
            .count() as u32
    }

    /// Flips every vote of the round visible.
    pub fn reveal_votes_in_round(&mut self, round_id: &RoundId) {
        for vote in self
            .votes
            .values_mut()
            .filter(|v| v.round_id() == round_id)
        {
            vote.mark_revealed();
        }
    }
}

/// Registry of all rooms, each behind its own mutex.
pub struct RoomStore {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<RoomRecords>>>>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a freshly created room.
    pub async fn insert(&self, records: RoomRecords) {
        let room_id = *records.room().id();
        self.rooms
            .write()
            .await
            .insert(room_id, Arc::new(Mutex::new(records)));
    }

    /// Hands out the per-room lock.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound` if the room does not exist
    pub async fn get(&self, room_id: &RoomId) -> Result<Arc<Mutex<RoomRecords>>, DomainError> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or(DomainError::RoomNotFound(*room_id))
    }

    /// Number of rooms ever created in this process.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}
