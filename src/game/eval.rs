//! Best-five hand evaluation.
//!
//! `evaluate` takes 5 to 7 cards, enumerates every 5-card subset, scores
//! each independently, and keeps the maximum. Scoring is pure arithmetic
//! over rank counts and suits; nothing here touches shared state, so any
//! number of showdown participants can be evaluated from the same slices.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::entities::{Card, Value};

/// Hand categories from weakest to strongest. A royal flush is the straight
/// flush running ten through ace.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
            Self::RoyalFlush => "royal flush",
        };
        write!(f, "{repr}")
    }
}

/// A scored 5-card hand. `tiebreakers` holds the deciding rank values in
/// descending priority (pairs before kickers, kickers high to low), so two
/// hands compare by category first and then lexicographically.
///
/// `best_five` records which cards made the hand; it never participates in
/// comparison, since equal category and tiebreakers is a tie no matter
/// which suits composed it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HandRank {
    pub category: Category,
    pub tiebreakers: Vec<Value>,
    pub best_five: Vec<Card>,
}

impl PartialEq for HandRank {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.tiebreakers == other.tiebreakers
    }
}

impl Eq for HandRank {}

impl PartialOrd for HandRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then_with(|| self.tiebreakers.cmp(&other.tiebreakers))
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cards = self
            .best_five
            .iter()
            .map(Card::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{} ({cards})", self.category)
    }
}

/// Score the best 5-card hand available within `cards`.
///
/// Accepts 5 to 7 cards (2 hole cards plus up to 5 community cards); any
/// other count is a caller bug and panics. The input is never mutated.
pub fn evaluate(cards: &[Card]) -> HandRank {
    assert!(
        (5..=7).contains(&cards.len()),
        "evaluate takes 5 to 7 cards, got {}",
        cards.len()
    );

    let n = cards.len();
    let mut best: Option<HandRank> = None;
    for mask in 0u32..(1 << n) {
        if mask.count_ones() != 5 {
            continue;
        }
        let five: Vec<Card> = (0..n)
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| cards[i])
            .collect();
        let scored = score_five(&five);
        if best.as_ref().is_none_or(|b| scored > *b) {
            best = Some(scored);
        }
    }
    match best {
        Some(hand) => hand,
        None => unreachable!("5 to 7 cards always yield a 5-card subset"),
    }
}

/// Indices of the best hands in `hands`, ascending. More than one index
/// means a split.
pub fn winners(hands: &[HandRank]) -> Vec<usize> {
    let mut indices: Vec<usize> = Vec::new();
    for (i, hand) in hands.iter().enumerate() {
        match indices.first().map(|&j| hands[j].cmp(hand)) {
            None | Some(Ordering::Less) => {
                indices.clear();
                indices.push(i);
            }
            Some(Ordering::Equal) => indices.push(i),
            Some(Ordering::Greater) => {}
        }
    }
    indices
}

fn score_five(five: &[Card]) -> HandRank {
    debug_assert_eq!(five.len(), 5);

    let mut counts = [0u8; 15];
    for card in five {
        counts[card.0 as usize] += 1;
    }
    let flush = five.iter().all(|card| card.1 == five[0].1);

    // Distinct rank values, high to low.
    let distinct: Vec<Value> = (2..=14u8).rev().filter(|&v| counts[v as usize] > 0).collect();

    // A straight needs 5 distinct values, consecutive or the wheel, where
    // the ace counts as 1 and the five plays high.
    let straight_high: Option<Value> = if distinct.len() == 5 {
        if distinct[0] - distinct[4] == 4 {
            Some(distinct[0])
        } else if distinct == [14, 5, 4, 3, 2] {
            Some(5)
        } else {
            None
        }
    } else {
        None
    };

    let (category, tiebreakers) = if let Some(high) = straight_high {
        let category = match (flush, high) {
            (true, 14) => Category::RoyalFlush,
            (true, _) => Category::StraightFlush,
            (false, _) => Category::Straight,
        };
        let tiebreakers = (0..5).map(|i| high - i as Value).collect();
        (category, tiebreakers)
    } else {
        // Group ranks by multiplicity, largest group first, higher values
        // first within equal multiplicities.
        let mut groups: Vec<(u8, Value)> =
            distinct.iter().map(|&v| (counts[v as usize], v)).collect();
        groups.sort_by(|a, b| b.cmp(a));

        let shape: Vec<u8> = groups.iter().map(|&(count, _)| count).collect();
        let category = match shape.as_slice() {
            [4, 1] => Category::FourOfAKind,
            [3, 2] => Category::FullHouse,
            [3, 1, 1] => Category::ThreeOfAKind,
            [2, 2, 1] => Category::TwoPair,
            [2, 1, 1, 1] => Category::OnePair,
            [1, 1, 1, 1, 1] if flush => Category::Flush,
            [1, 1, 1, 1, 1] => Category::HighCard,
            _ => unreachable!("5 cards always group into one of six shapes"),
        };
        let tiebreakers = groups.iter().map(|&(_, value)| value).collect();
        (category, tiebreakers)
    };

    // Present the hand pairs-first, then kickers high to low.
    let mut best_five = five.to_vec();
    best_five.sort_by(|a, b| {
        (counts[b.0 as usize], b.0).cmp(&(counts[a.0 as usize], a.0))
    });

    HandRank {
        category,
        tiebreakers,
        best_five,
    }
}
