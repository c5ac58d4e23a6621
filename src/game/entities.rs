use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self};

/// Maximum accepted length for a player name, in characters; longer names
/// are truncated.
pub const MAX_NAME_LEN: usize = 16;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values. Deuce is 2 and ace is 14; the ace only
/// counts low inside wheel-straight detection.
pub type Value = u8;

/// A card is a tuple of a value and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            14 => "A",
            13 => "K",
            12 => "Q",
            11 => "J",
            v => &v.to_string(),
        };
        write!(f, "{value}{}", self.1)
    }
}

/// What an observer is allowed to see of a card. Opponents' concealed hole
/// cards cross the boundary as `Hidden` so that neither value nor suit
/// leaks.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "visibility", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardView {
    Hidden,
    Shown { value: Value, suit: Suit },
}

impl From<Card> for CardView {
    fn from(card: Card) -> Self {
        Self::Shown {
            value: card.0,
            suit: card.1,
        }
    }
}

#[derive(Debug)]
pub struct Deck {
    cards: [Card; 52],
    next: usize,
}

impl Deck {
    /// Remove and return the top card.
    ///
    /// Drawing from an empty deck is a bug in the caller (a hand needs at
    /// most 2 cards per seat plus 5 community cards) and panics.
    pub fn draw(&mut self) -> Card {
        if self.next >= self.cards.len() {
            panic!("draw from an empty deck");
        }
        let card = self.cards[self.next];
        self.next += 1;
        card
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.next
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
        self.next = 0;
    }
}

impl Default for Deck {
    fn default() -> Self {
        let cards: [Card; 52] = std::array::from_fn(|i| {
            let value = 2 + (i / 4) as Value;
            Card(value, Suit::ALL[i % 4])
        });
        Self { cards, next: 0 }
    }
}

/// Type alias for whole chips. All stacks, bets, and pots are counted in
/// whole chips; there are no fractional units to argue over.
///
/// A single table holding more than ~4.2 billion chips has bigger problems
/// than integer width.
pub type Chips = u32;

/// Type alias for seat positions at a table.
pub type SeatNumber = usize;

/// Type alias for table identifiers.
pub type TableId = i64;

/// Type alias for externally-assigned user identifiers.
pub type UserId = i64;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        // Cap by character count; a byte-index truncation could split a
        // multi-byte character.
        let name: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .take(MAX_NAME_LEN)
            .collect();
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A resolved identity. Registration and authentication happen upstream;
/// the engine only ever sees users that already exist.
#[derive(Clone, Debug, Deserialize, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: Username,
}

impl User {
    pub fn new(id: UserId, name: &str) -> Self {
        Self {
            id,
            name: Username::new(name),
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::hash::Hash for User {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Everything a player can do at the table, including the two forced bets
/// the engine posts on their behalf. Voluntary submissions are limited to
/// the last four variants; a blind arriving from a client is ignored.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    SmallBlind,
    BigBlind,
    Fold,
    Check,
    Call,
    Raise,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::SmallBlind => "posts the small blind",
            Self::BigBlind => "posts the big blind",
            Self::Fold => "folds",
            Self::Check => "checks",
            Self::Call => "calls",
            Self::Raise => "raises",
        };
        write!(f, "{repr}")
    }
}

/// Betting stages for one hand, in play order. `Showdown` is transient
/// (evaluation and payout happen inside the same transition) and `Finished`
/// is terminal.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    WaitingForPlayers,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
    Finished,
}

impl Stage {
    pub fn is_betting(&self) -> bool {
        matches!(self, Self::PreFlop | Self::Flop | Self::Turn | Self::River)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::WaitingForPlayers => "waiting for players",
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.small, self.big)
    }
}

/// A table position bound to a player: their stack and all per-hand
/// participation state. Owned by the table; the active session borrows the
/// seat map for the duration of each call.
#[derive(Clone, Debug)]
pub struct Seat {
    pub seat_number: SeatNumber,
    pub user: User,
    pub stack: Chips,
    pub hole_cards: Vec<Card>,
    pub in_hand: bool,
    pub all_in: bool,
    /// Chips committed in the current betting round; swept into the pot
    /// when the round closes.
    pub bet_amount: Chips,
    /// Chips committed across the whole hand, blinds included.
    pub total_contribution: Chips,
}

impl Seat {
    #[must_use]
    pub fn new(seat_number: SeatNumber, user: User, stack: Chips) -> Self {
        Self {
            seat_number,
            user,
            stack,
            hole_cards: Vec::with_capacity(2),
            in_hand: false,
            all_in: false,
            bet_amount: 0,
            total_contribution: 0,
        }
    }

    /// Move chips from the stack into the current round's bet. Callers
    /// validate affordability first; overdrawing the stack is a bug.
    pub fn commit(&mut self, amount: Chips) {
        assert!(
            amount <= self.stack,
            "seat {} committed {amount} with only {} behind",
            self.seat_number,
            self.stack
        );
        self.stack -= amount;
        self.bet_amount += amount;
        self.total_contribution += amount;
        if self.stack == 0 {
            self.all_in = true;
        }
    }

    /// Leave the hand. The round bet stays put so it still reaches the pot
    /// at the next sweep.
    pub fn fold(&mut self) {
        self.in_hand = false;
    }

    pub fn reset_for_hand(&mut self) {
        self.hole_cards.clear();
        self.in_hand = false;
        self.all_in = false;
        self.bet_amount = 0;
        self.total_contribution = 0;
    }

    pub fn view(&self) -> SeatView {
        SeatView {
            seat_number: self.seat_number,
            username: self.user.name.clone(),
            stack: self.stack,
            in_hand: self.in_hand,
            all_in: self.all_in,
            bet_amount: self.bet_amount,
            total_contribution: self.total_contribution,
        }
    }
}

/// Public projection of a seat: everything observers may see. Hole cards
/// never appear here; they travel only in personalized payloads.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub seat_number: SeatNumber,
    pub username: Username,
    pub stack: Chips,
    pub in_hand: bool,
    pub all_in: bool,
    pub bet_amount: Chips,
    pub total_contribution: Chips,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fresh_deck_has_52_unique_cards() {
        let mut deck = Deck::default();
        let mut seen = HashSet::new();
        for _ in 0..52 {
            let card = deck.draw();
            assert!((2..=14).contains(&card.0));
            assert!(seen.insert(card));
        }
        assert_eq!(deck.remaining(), 0);
    }

    #[test]
    fn shuffle_preserves_the_card_set() {
        let mut deck = Deck::default();
        deck.shuffle();
        let mut seen = HashSet::new();
        for _ in 0..52 {
            assert!(seen.insert(deck.draw()));
        }
        assert_eq!(seen.len(), 52);
    }

    #[test]
    #[should_panic(expected = "empty deck")]
    fn drawing_the_53rd_card_panics() {
        let mut deck = Deck::default();
        for _ in 0..52 {
            deck.draw();
        }
        deck.draw();
    }

    #[test]
    fn commit_moves_chips_and_flags_all_in_at_zero() {
        let mut seat = Seat::new(3, User::new(7, "dana"), 100);
        seat.in_hand = true;

        seat.commit(40);
        assert_eq!(seat.stack, 60);
        assert_eq!(seat.bet_amount, 40);
        assert_eq!(seat.total_contribution, 40);
        assert!(!seat.all_in);

        seat.commit(60);
        assert_eq!(seat.stack, 0);
        assert_eq!(seat.bet_amount, 100);
        assert!(seat.all_in);
    }

    #[test]
    #[should_panic(expected = "committed")]
    fn commit_past_the_stack_panics() {
        let mut seat = Seat::new(0, User::new(1, "al"), 10);
        seat.commit(11);
    }

    #[test]
    fn fold_keeps_the_round_bet() {
        let mut seat = Seat::new(1, User::new(2, "bo"), 100);
        seat.in_hand = true;
        seat.commit(25);
        seat.fold();
        assert!(!seat.in_hand);
        assert_eq!(seat.bet_amount, 25);
    }

    #[test]
    fn usernames_are_sanitized_and_truncated() {
        let name = Username::new("one two\tthree");
        assert_eq!(name.as_str(), "one_two_three");

        let long = Username::new("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(long.as_str().len(), MAX_NAME_LEN);
    }

    #[test]
    fn usernames_truncate_on_character_boundaries() {
        // 16 characters land mid-way through a multi-byte name.
        let name = Username::new(&format!("a{}", "é".repeat(20)));
        assert_eq!(name.as_str().chars().count(), MAX_NAME_LEN);
        assert_eq!(name.as_str(), format!("a{}", "é".repeat(15)));
    }

    #[test]
    fn stages_serialize_screaming_snake() {
        let json = serde_json::to_string(&Stage::PreFlop).unwrap();
        assert_eq!(json, "\"PRE_FLOP\"");
        let json = serde_json::to_string(&Stage::WaitingForPlayers).unwrap();
        assert_eq!(json, "\"WAITING_FOR_PLAYERS\"");
    }

    #[test]
    fn hidden_cards_reveal_nothing() {
        let json = serde_json::to_string(&CardView::Hidden).unwrap();
        assert!(!json.contains("value"));
        assert!(!json.contains("suit"));

        let shown: CardView = Card(14, Suit::Spade).into();
        let json = serde_json::to_string(&shown).unwrap();
        assert!(json.contains("\"value\":14"));
    }

    #[test]
    fn card_display_uses_face_letters() {
        assert_eq!(Card(14, Suit::Spade).to_string(), "A♠");
        assert_eq!(Card(10, Suit::Heart).to_string(), "10♥");
        assert_eq!(Card(11, Suit::Club).to_string(), "J♣");
    }
}
