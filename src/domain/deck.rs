//! Deck catalog - static mapping from deck type to ordered card values.
//!
//! A room copies its deck values at creation time, so edits to the catalog
//! never retroactively change an in-progress room.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::foundation::DomainError;

/// Fibonacci-style sequence with uncertainty markers.
pub const DECK_FIBONACCI: &str = "FIBONACCI";
/// Linear integer sequence 1 through 10.
pub const DECK_LINEAR: &str = "LINEAR";
/// T-shirt size labels, smallest to largest.
pub const DECK_TSHIRT: &str = "TSHIRT";

static BUILT_IN_DECKS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut decks = HashMap::new();
    decks.insert(
        DECK_FIBONACCI,
        vec![
            "0", "1", "2", "3", "5", "8", "13", "21", "34", "55", "89", "?", "☕",
        ],
    );
    decks.insert(
        DECK_LINEAR,
        vec!["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"],
    );
    decks.insert(DECK_TSHIRT, vec!["XS", "S", "M", "L", "XL"]);
    decks
});

/// Catalog of the built-in card decks.
///
/// Pure data; resolving a deck never mutates anything.
pub struct DeckCatalog;

impl DeckCatalog {
    /// Resolves a deck type to its ordered list of card values.
    ///
    /// # Errors
    ///
    /// - `UnknownDeck` if the type is not registered
    pub fn resolve(deck_type: &str) -> Result<Vec<String>, DomainError> {
        BUILT_IN_DECKS
            .get(deck_type)
            .map(|values| values.iter().map(|v| v.to_string()).collect())
            .ok_or_else(|| DomainError::UnknownDeck(deck_type.to_string()))
    }

    /// Returns the registered deck type identifiers.
    pub fn deck_types() -> Vec<&'static str> {
        let mut types: Vec<&'static str> = BUILT_IN_DECKS.keys().copied().collect();
        types.sort_unstable();
        types
    }
}
