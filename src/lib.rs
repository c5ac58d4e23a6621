//! # table_stakes
//!
//! A real-money poker table and betting-session engine: the betting-round
//! state machine, seat and stack bookkeeping, best-five hand evaluation,
//! and the single-writer dispatch harness that keeps concurrent player
//! actions from corrupting shared table state.
//!
//! Everything around the engine stays external: authentication resolves
//! identities before they get here, a ledger settles buy-ins and cash-outs,
//! and the wire transport consumes the [`Notification`] events this crate
//! emits. The engine never touches a database or a socket.
//!
//! ## Architecture
//!
//! - [`game`]: cards, decks, hand evaluation, and the `GameSession` state
//!   machine that runs one hand from blind posting to payout.
//! - [`table`]: seating, waiting lists, dealer rotation, the session
//!   lifecycle, and the registry of live tables.
//! - [`dispatch`]: two bounded channels and two workers. The game worker is
//!   the only task that ever mutates a table (single-writer rule); the
//!   notifier fans completed notifications out to connection sinks and
//!   never blocks on a slow one.
//!
//! ## Example
//!
//! ```no_run
//! use table_stakes::{spawn_engine, TableConfig, User};
//! use tokio::sync::mpsc;
//!
//! # async fn demo() -> Result<(), table_stakes::EngineError> {
//! let engine = spawn_engine(256);
//!
//! let (tx, _rx) = mpsc::channel(64);
//! let connection = engine.connect(tx).await?;
//! engine.authenticate(connection, User::new(1, "alice")).await?;
//!
//! let table = engine.create_table(TableConfig::default()).await?;
//! engine.join_table(connection, table.id).await?;
//! engine.take_seat(connection, table.id, 0, 1_000).await?;
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod game;
pub mod table;

pub use dispatch::{
    DEFAULT_CHANNEL_CAPACITY, EngineError, EngineHandle, Notification, OpError, spawn_engine,
};
pub use game::{
    ActionError, ActionType, Blinds, Card, CardView, Category, Chips, Deck, HandRank, Seat,
    SeatNumber, Stage, Suit, TableId, User, UserId, Username, evaluate,
};
pub use table::{
    ConnectionId, Registry, Table, TableAction, TableConfig, TableError, TableSnapshot,
};
