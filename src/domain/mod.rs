//! Domain layer - entities, value objects, and pure estimation logic.

pub mod deck;
pub mod foundation;
pub mod room;
pub mod statistics;
