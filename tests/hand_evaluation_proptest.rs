//! Property-based tests for hand evaluation.
//!
//! Fixed fixtures pin down the rankings the engine's payouts depend on;
//! the proptest block checks the structural properties that must hold for
//! every legal input.

use proptest::prelude::*;
use std::collections::BTreeSet;
use table_stakes::game::eval::{Category, evaluate, winners};
use table_stakes::game::{Card, Suit};

fn card_strategy() -> impl Strategy<Value = Card> {
    (2u8..=14, 0usize..4).prop_map(|(value, suit)| Card(value, Suit::ALL[suit]))
}

fn unique_cards(count: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), count..=count).prop_filter(
        "cards must be unique",
        |cards| {
            let set: BTreeSet<_> = cards.iter().collect();
            set.len() == cards.len()
        },
    )
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(cards in unique_cards(7)) {
        prop_assert_eq!(evaluate(&cards), evaluate(&cards));
    }

    #[test]
    fn best_five_is_drawn_from_the_input(cards in unique_cards(7)) {
        let hand = evaluate(&cards);
        prop_assert_eq!(hand.best_five.len(), 5);
        for card in &hand.best_five {
            prop_assert!(cards.contains(card));
        }
        let set: BTreeSet<_> = hand.best_five.iter().collect();
        prop_assert_eq!(set.len(), 5, "best five must not repeat a card");
    }

    #[test]
    fn input_order_never_matters(cards in unique_cards(7)) {
        let mut reversed = cards.clone();
        reversed.reverse();
        prop_assert_eq!(evaluate(&cards), evaluate(&reversed));
    }

    #[test]
    fn seven_cards_never_rank_below_their_subsets(cards in unique_cards(7)) {
        // The best of 21 subsets can only improve on any single subset.
        let five = evaluate(&cards[..5]);
        let seven = evaluate(&cards);
        prop_assert!(seven >= five);
    }

    #[test]
    fn tiebreakers_are_valid_ranks(cards in unique_cards(7)) {
        let hand = evaluate(&cards);
        prop_assert!(!hand.tiebreakers.is_empty());
        for &value in &hand.tiebreakers {
            // Rank 1 only appears as the wheel's low ace.
            prop_assert!((1..=14).contains(&value));
        }
    }

    #[test]
    fn winners_are_sorted_unique_and_tied(hands in prop::collection::vec(unique_cards(5), 2..=9)) {
        let ranked: Vec<_> = hands.iter().map(|cards| evaluate(cards)).collect();
        let winning = winners(&ranked);

        prop_assert!(!winning.is_empty());
        let mut sorted = winning.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(&winning, &sorted);

        // Every winner ties with the first; everyone else ranks below.
        let best = &ranked[winning[0]];
        for (i, hand) in ranked.iter().enumerate() {
            if winning.contains(&i) {
                prop_assert_eq!(hand, best);
            } else {
                prop_assert!(hand < best);
            }
        }
    }
}

#[test]
fn royal_flush_fixture() {
    let cards = [
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(12, Suit::Spade),
        Card(11, Suit::Spade),
        Card(10, Suit::Spade),
        Card(2, Suit::Heart),
        Card(3, Suit::Diamond),
    ];
    assert_eq!(evaluate(&cards).category, Category::RoyalFlush);
}

#[test]
fn full_house_fixture_prefers_trips() {
    let cards = [
        Card(2, Suit::Heart),
        Card(2, Suit::Diamond),
        Card(2, Suit::Club),
        Card(5, Suit::Spade),
        Card(5, Suit::Diamond),
        Card(9, Suit::Heart),
        Card(9, Suit::Club),
    ];
    let hand = evaluate(&cards);
    assert_eq!(hand.category, Category::FullHouse);
    assert_eq!(hand.tiebreakers, vec![2, 9]);
}

#[test]
fn high_card_fixture_sorts_kickers_descending() {
    let cards = [
        Card(2, Suit::Heart),
        Card(5, Suit::Diamond),
        Card(9, Suit::Club),
        Card(11, Suit::Spade),
        Card(13, Suit::Heart),
        Card(3, Suit::Diamond),
        Card(7, Suit::Club),
    ];
    let hand = evaluate(&cards);
    assert_eq!(hand.category, Category::HighCard);
    assert_eq!(hand.tiebreakers, vec![13, 11, 9, 7, 5]);
}

#[test]
fn wheel_fixture_is_a_straight_below_six_high() {
    let wheel = evaluate(&[
        Card(14, Suit::Heart),
        Card(2, Suit::Spade),
        Card(3, Suit::Diamond),
        Card(4, Suit::Club),
        Card(5, Suit::Heart),
    ]);
    assert_eq!(wheel.category, Category::Straight);

    let six_high = evaluate(&[
        Card(2, Suit::Heart),
        Card(3, Suit::Spade),
        Card(4, Suit::Diamond),
        Card(5, Suit::Club),
        Card(6, Suit::Heart),
    ]);
    assert!(six_high > wheel);
}

#[test]
fn category_ladder_is_total() {
    // One representative hand per category, weakest to strongest; each must
    // beat everything before it.
    let hands = vec![
        evaluate(&[
            Card(2, Suit::Heart),
            Card(5, Suit::Diamond),
            Card(9, Suit::Club),
            Card(11, Suit::Spade),
            Card(13, Suit::Heart),
        ]),
        evaluate(&[
            Card(2, Suit::Heart),
            Card(2, Suit::Diamond),
            Card(9, Suit::Club),
            Card(11, Suit::Spade),
            Card(13, Suit::Heart),
        ]),
        evaluate(&[
            Card(2, Suit::Heart),
            Card(2, Suit::Diamond),
            Card(9, Suit::Club),
            Card(9, Suit::Spade),
            Card(13, Suit::Heart),
        ]),
        evaluate(&[
            Card(2, Suit::Heart),
            Card(2, Suit::Diamond),
            Card(2, Suit::Club),
            Card(9, Suit::Spade),
            Card(13, Suit::Heart),
        ]),
        evaluate(&[
            Card(5, Suit::Heart),
            Card(6, Suit::Diamond),
            Card(7, Suit::Club),
            Card(8, Suit::Spade),
            Card(9, Suit::Heart),
        ]),
        evaluate(&[
            Card(2, Suit::Heart),
            Card(5, Suit::Heart),
            Card(9, Suit::Heart),
            Card(11, Suit::Heart),
            Card(13, Suit::Heart),
        ]),
        evaluate(&[
            Card(2, Suit::Heart),
            Card(2, Suit::Diamond),
            Card(2, Suit::Club),
            Card(9, Suit::Spade),
            Card(9, Suit::Heart),
        ]),
        evaluate(&[
            Card(2, Suit::Heart),
            Card(2, Suit::Diamond),
            Card(2, Suit::Club),
            Card(2, Suit::Spade),
            Card(13, Suit::Heart),
        ]),
        evaluate(&[
            Card(5, Suit::Heart),
            Card(6, Suit::Heart),
            Card(7, Suit::Heart),
            Card(8, Suit::Heart),
            Card(9, Suit::Heart),
        ]),
        evaluate(&[
            Card(10, Suit::Heart),
            Card(11, Suit::Heart),
            Card(12, Suit::Heart),
            Card(13, Suit::Heart),
            Card(14, Suit::Heart),
        ]),
    ];

    let expected = [
        Category::HighCard,
        Category::OnePair,
        Category::TwoPair,
        Category::ThreeOfAKind,
        Category::Straight,
        Category::Flush,
        Category::FullHouse,
        Category::FourOfAKind,
        Category::StraightFlush,
        Category::RoyalFlush,
    ];
    for (hand, &category) in hands.iter().zip(&expected) {
        assert_eq!(hand.category, category);
    }
    for window in hands.windows(2) {
        assert!(window[0] < window[1]);
    }
}
