//! Errors from table and registry operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::entities::{Chips, SeatNumber, TableId};

#[derive(Clone, Debug, Deserialize, Error, Eq, PartialEq, Serialize)]
pub enum TableError {
    #[error("seat {0} is already taken")]
    SeatTaken(SeatNumber),

    #[error("the table is full")]
    TableFull,

    #[error("seat {seat} does not exist at this table ({max_seats} seats)")]
    InvalidSeat { seat: SeatNumber, max_seats: usize },

    #[error("buy-in of {buy_in} is outside the allowed range {min}..={max}")]
    InvalidBuyIn {
        buy_in: Chips,
        min: Chips,
        max: Chips,
    },

    #[error("seat {0} is empty")]
    SeatEmpty(SeatNumber),

    #[error("seat {0} belongs to another player")]
    NotOwner(SeatNumber),

    #[error("already seated at this table")]
    AlreadySeated,

    #[error("already on the waiting list")]
    AlreadyWaitlisted,

    #[error("no table with id {0}")]
    NoSuchTable(TableId),

    #[error("invalid table configuration: {0}")]
    InvalidConfig(String),
}
