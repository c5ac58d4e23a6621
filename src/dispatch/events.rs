//! The inbound event union drained by the game worker.
//!
//! Every way the outside world can poke the engine is one variant here, so
//! the worker's dispatch is a single exhaustive `match`. Request/response
//! operations carry a `oneshot` responder, actor-mailbox style; fire-and-
//! forget lifecycle events carry none.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::outbound::Notification;
use crate::game::entities::{ActionType, Chips, SeatNumber, TableId, User};
use crate::game::errors::ActionError;
use crate::table::{ConnectionId, TableConfig, TableError, TableSnapshot};

/// Why an engine operation failed. Protocol and table errors also reach the
/// originating connection as an `ERROR` notification.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum OpError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("this connection has not authenticated")]
    NotAuthenticated,

    #[error("this connection has not joined a table")]
    NotAtTable,
}

#[derive(Debug)]
pub enum InboundEvent {
    /// A connection opened; its notification sink is registered with the
    /// notifier before anything can be delivered to it.
    Connected {
        connection: ConnectionId,
        sink: mpsc::Sender<Notification>,
    },
    /// Upstream authentication resolved this connection to a user. A second
    /// connection authenticating as the same user takes over that user's
    /// personalized routing.
    Authenticated {
        connection: ConnectionId,
        user: User,
    },
    /// A connection closed: unregister its sink, drop its table membership,
    /// and vacate any seat its user held.
    Disconnected { connection: ConnectionId },

    CreateTable {
        config: TableConfig,
        respond: oneshot::Sender<Result<TableSnapshot, TableError>>,
    },
    DeleteTable {
        table_id: TableId,
        respond: oneshot::Sender<Result<(), TableError>>,
    },
    ListTables {
        respond: oneshot::Sender<Vec<TableSnapshot>>,
    },

    /// Start observing a table; a connection observes at most one table, so
    /// joining another leaves the previous one first.
    JoinTable {
        connection: ConnectionId,
        table_id: TableId,
        respond: oneshot::Sender<Result<TableSnapshot, TableError>>,
    },
    LeaveTable {
        connection: ConnectionId,
        respond: oneshot::Sender<Result<(), OpError>>,
    },

    TakeSeat {
        connection: ConnectionId,
        table_id: TableId,
        seat_number: SeatNumber,
        buy_in: Chips,
        respond: oneshot::Sender<Result<(), OpError>>,
    },
    /// Responds with the cashed-out stack; settling it against a ledger is
    /// the caller's problem.
    LeaveSeat {
        connection: ConnectionId,
        table_id: TableId,
        seat_number: SeatNumber,
        respond: oneshot::Sender<Result<Chips, OpError>>,
    },
    JoinWaitlist {
        connection: ConnectionId,
        table_id: TableId,
        buy_in: Chips,
        respond: oneshot::Sender<Result<(), OpError>>,
    },
    SubmitAction {
        connection: ConnectionId,
        table_id: TableId,
        action: ActionType,
        amount: Chips,
        respond: oneshot::Sender<Result<(), OpError>>,
    },
}
