//! Application layer - the estimation authority and its state store.

mod authority;
mod store;

pub use authority::{CreatedRoom, EstimationAuthority, RevealOutcome, VoteProgress};
pub use store::{RoomRecords, RoomStore};
