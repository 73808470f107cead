//! Statistics engine - aggregates computed over a round's votes at reveal.
//!
//! Pure functions only; the authority passes in the vote card values and
//! the room's deck values and gets back the aggregate view.
//!
//! # Numeric coercion
//!
//! A card value participates in numeric aggregates when it parses as a
//! finite number, or when it is one of the t-shirt size labels which carry
//! fixed ranks (XS=1 .. XL=5). Everything else ("?", "☕") is excluded from
//! the numeric aggregates but still counted in the distribution.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed ranks for the ordinal size labels.
const SIZE_RANKS: [(&str, f64); 5] = [
    ("XS", 1.0),
    ("S", 2.0),
    ("M", 3.0),
    ("L", 4.0),
    ("XL", 5.0),
];

/// Aggregate view of one revealed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteStatistics {
    /// Mean of all numeric-eligible votes; 0 when none are eligible.
    pub average: f64,

    /// Median of all numeric-eligible votes; 0 when none are eligible.
    pub median: f64,

    /// Literal card value with the highest numeric rank.
    pub highest: String,

    /// Literal card value with the lowest numeric rank.
    pub lowest: String,

    /// Deck value closest to the rounded average; empty for zero votes.
    pub suggested_estimate: String,

    /// Count of votes per card value, voted values only.
    pub distribution: HashMap<String, u32>,
}

/// Returns the numeric rank of a card value, if it has one.
pub fn numeric_rank(card_value: &str) -> Option<f64> {
    if let Ok(n) = card_value.trim().parse::<f64>() {
        if n.is_finite() {
            return Some(n);
        }
    }
    SIZE_RANKS
        .iter()
        .find(|(label, _)| *label == card_value)
        .map(|(_, rank)| *rank)
}

/// Computes the aggregate statistics for one round.
///
/// `card_values` are the raw votes in cast order; `deck_values` is the
/// room's ordered deck, used to pick the suggested estimate.
pub fn compute_statistics(card_values: &[String], deck_values: &[String]) -> VoteStatistics {
    let mut distribution: HashMap<String, u32> = HashMap::new();
    for value in card_values {
        *distribution.entry(value.clone()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&String, f64)> = card_values
        .iter()
        .filter_map(|v| numeric_rank(v).map(|rank| (v, rank)))
        .collect();

    let average = if ranked.is_empty() {
        0.0
    } else {
        ranked.iter().map(|(_, rank)| rank).sum::<f64>() / ranked.len() as f64
    };

    let median = median_of(&mut ranked);

    // When no vote is numeric-eligible the first raw vote is used for both
    // extremes. Arbitrary, but kept for compatibility with prior behavior.
    let (highest, lowest) = if ranked.is_empty() {
        let fallback = card_values.first().cloned().unwrap_or_default();
        (fallback.clone(), fallback)
    } else {
        let highest = ranked
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(v, _)| (*v).clone())
            .unwrap_or_default();
        let lowest = ranked
            .iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(v, _)| (*v).clone())
            .unwrap_or_default();
        (highest, lowest)
    };

    let suggested_estimate = if card_values.is_empty() {
        String::new()
    } else {
        suggest_estimate(average, deck_values)
    };

    VoteStatistics {
        average,
        median,
        highest,
        lowest,
        suggested_estimate,
        distribution,
    }
}

/// Median over the ranked votes; mean of the two middle values for even
/// counts, 0 for an empty set.
fn median_of(ranked: &mut [(&String, f64)]) -> f64 {
    if ranked.is_empty() {
        return 0.0;
    }
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    let mid = ranked.len() / 2;
    if ranked.len() % 2 == 1 {
        ranked[mid].1
    } else {
        (ranked[mid - 1].1 + ranked[mid].1) / 2.0
    }
}

/// Picks the deck value whose rank is closest to the rounded average,
/// ties broken toward the earlier deck value.
fn suggest_estimate(average: f64, deck_values: &[String]) -> String {
    let target = average.round();

    let mut best: Option<(&String, f64)> = None;
    for value in deck_values {
        if let Some(rank) = numeric_rank(value) {
            let distance = (rank - target).abs();
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((value, distance)),
            }
        }
    }

    match best {
        Some((value, _)) => value.clone(),
        // Deck with no numeric-eligible values at all: fall back to the
        // rounded integer's string form.
        None => format!("{}", target as i64),
    }
}
