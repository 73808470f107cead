//! Room domain - the entities of one estimation session.
//!
//! # Ownership
//!
//! The estimation authority exclusively owns every collection of these
//! entities; nothing outside the application layer mutates them. Rounds
//! and votes are owned through their parent item and are cascade-deleted
//! with it.

mod events;
mod item;
mod participant;
#[allow(clippy::module_inception)]
mod room;
mod round;
mod summary;
mod vote;

pub use events::{ItemSnapshot, RevealedVote, RoomEvent};
pub use item::{Item, MAX_ITEM_DESCRIPTION_LENGTH, MAX_ITEM_TITLE_LENGTH};
pub use participant::{Participant, ParticipantRole, MAX_DISPLAY_NAME_LENGTH};
pub use room::{Room, RoomState, MAX_ROOM_NAME_LENGTH};
pub use round::{Round, RoundState};
pub use summary::RoomSummary;
pub use vote::Vote;
