//! Poker game engine: cards, hand evaluation, and the betting session.
//!
//! This module provides the in-hand half of the engine:
//! - Value types (cards, decks, chips, users, seats, stages)
//! - Best-five hand evaluation over 5 to 7 cards
//! - The betting-round state machine for one hand

pub mod entities;
pub mod errors;
pub mod eval;
pub mod session;

pub use entities::{
    ActionType, Blinds, Card, CardView, Chips, Deck, Seat, SeatNumber, SeatView, Stage, Suit,
    TableId, User, UserId, Username, Value,
};
pub use errors::ActionError;
pub use eval::{Category, HandRank, evaluate, winners};
pub use session::{GameSession, Seats, SessionEvent};
