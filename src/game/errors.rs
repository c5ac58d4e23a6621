//! Player-facing errors from the betting state machine.
//!
//! Only protocol violations become errors: acting out of turn, acting from
//! an unknown seat, acting after the hand ended, or raising below the table
//! minimum. Soft rule violations (checking into a bet, short or non-positive
//! calls) are logged no-ops and never surface here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Chips, SeatNumber};

#[derive(Clone, Debug, Deserialize, Error, Eq, PartialEq, Serialize)]
pub enum ActionError {
    #[error("it is not seat {0}'s turn to act")]
    NotYourTurn(SeatNumber),

    #[error("seat {0} is not part of this hand")]
    UnknownPlayer(SeatNumber),

    #[error("you do not hold a seat at this table")]
    NotSeated,

    #[error("the hand is already over")]
    HandOver,

    #[error("raise of {amount} is below the table minimum of {min_raise}")]
    InvalidAmount { amount: Chips, min_raise: Chips },
}
