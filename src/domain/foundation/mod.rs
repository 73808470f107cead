//! Foundation value objects shared across the domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::DomainError;
pub use ids::{ItemId, ParticipantId, RoomId, RoundId, VoteId};
pub use timestamp::Timestamp;
