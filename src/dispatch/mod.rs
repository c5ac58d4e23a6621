//! The two-worker dispatch harness.
//!
//! `spawn_engine` wires two bounded channels and two tasks: the game worker
//! (owns every table, drains inbound events in order) and the notifier
//! (owns every connection sink, drains outbound envelopes). Strict
//! per-table action ordering falls out of the single inbound queue, and a
//! slow or dead connection can never block game logic because the only
//! thing the game worker ever awaits is the handoff to the notifier.
//!
//! `EngineHandle` is the whole public API surface: cheap to clone, safe to
//! call from any task.

pub mod events;
pub mod outbound;

mod notifier;
mod worker;

pub use events::{InboundEvent, OpError};
pub use outbound::{Notification, OutboundEvent};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::game::entities::{ActionType, Chips, SeatNumber, TableId, User};
use crate::table::{ConnectionId, TableConfig, TableSnapshot};
use notifier::Notifier;
use worker::GameWorker;

/// Bound for both the inbound and outbound channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EngineError {
    /// The engine's tasks have shut down (runtime teardown); no operation
    /// can succeed anymore.
    #[error("the engine has shut down")]
    Closed,

    #[error(transparent)]
    Op(#[from] OpError),
}

/// Spawn the game worker and the notifier, returning the handle that feeds
/// them. Dropping every handle closes the inbound channel and winds both
/// workers down.
pub fn spawn_engine(capacity: usize) -> EngineHandle {
    let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
    let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
    tokio::spawn(GameWorker::new(inbound_rx, outbound_tx).run());
    tokio::spawn(Notifier::new(outbound_rx).run());
    EngineHandle {
        inbound: inbound_tx,
    }
}

#[derive(Clone, Debug)]
pub struct EngineHandle {
    inbound: mpsc::Sender<InboundEvent>,
}

impl EngineHandle {
    /// Register a connection and the sink its notifications go to. The
    /// returned id names this connection in every later call.
    pub async fn connect(
        &self,
        sink: mpsc::Sender<Notification>,
    ) -> Result<ConnectionId, EngineError> {
        let connection = Uuid::new_v4();
        self.send(InboundEvent::Connected { connection, sink })
            .await?;
        Ok(connection)
    }

    /// Bind an already-resolved identity to a connection. Authentication
    /// itself happens upstream.
    pub async fn authenticate(
        &self,
        connection: ConnectionId,
        user: User,
    ) -> Result<(), EngineError> {
        self.send(InboundEvent::Authenticated { connection, user })
            .await
    }

    pub async fn disconnect(&self, connection: ConnectionId) -> Result<(), EngineError> {
        self.send(InboundEvent::Disconnected { connection }).await
    }

    pub async fn create_table(&self, config: TableConfig) -> Result<TableSnapshot, EngineError> {
        let (respond, rx) = oneshot::channel();
        self.send(InboundEvent::CreateTable { config, respond })
            .await?;
        Ok(self.wait(rx).await?.map_err(OpError::from)?)
    }

    pub async fn delete_table(&self, table_id: TableId) -> Result<(), EngineError> {
        let (respond, rx) = oneshot::channel();
        self.send(InboundEvent::DeleteTable { table_id, respond })
            .await?;
        Ok(self.wait(rx).await?.map_err(OpError::from)?)
    }

    pub async fn list_tables(&self) -> Result<Vec<TableSnapshot>, EngineError> {
        let (respond, rx) = oneshot::channel();
        self.send(InboundEvent::ListTables { respond }).await?;
        self.wait(rx).await
    }

    pub async fn join_table(
        &self,
        connection: ConnectionId,
        table_id: TableId,
    ) -> Result<TableSnapshot, EngineError> {
        let (respond, rx) = oneshot::channel();
        self.send(InboundEvent::JoinTable {
            connection,
            table_id,
            respond,
        })
        .await?;
        Ok(self.wait(rx).await?.map_err(OpError::from)?)
    }

    pub async fn leave_table(&self, connection: ConnectionId) -> Result<(), EngineError> {
        let (respond, rx) = oneshot::channel();
        self.send(InboundEvent::LeaveTable {
            connection,
            respond,
        })
        .await?;
        Ok(self.wait(rx).await??)
    }

    pub async fn take_seat(
        &self,
        connection: ConnectionId,
        table_id: TableId,
        seat_number: SeatNumber,
        buy_in: Chips,
    ) -> Result<(), EngineError> {
        let (respond, rx) = oneshot::channel();
        self.send(InboundEvent::TakeSeat {
            connection,
            table_id,
            seat_number,
            buy_in,
            respond,
        })
        .await?;
        Ok(self.wait(rx).await??)
    }

    /// Vacate a seat; resolves to the cashed-out stack.
    pub async fn leave_seat(
        &self,
        connection: ConnectionId,
        table_id: TableId,
        seat_number: SeatNumber,
    ) -> Result<Chips, EngineError> {
        let (respond, rx) = oneshot::channel();
        self.send(InboundEvent::LeaveSeat {
            connection,
            table_id,
            seat_number,
            respond,
        })
        .await?;
        Ok(self.wait(rx).await??)
    }

    pub async fn join_waitlist(
        &self,
        connection: ConnectionId,
        table_id: TableId,
        buy_in: Chips,
    ) -> Result<(), EngineError> {
        let (respond, rx) = oneshot::channel();
        self.send(InboundEvent::JoinWaitlist {
            connection,
            table_id,
            buy_in,
            respond,
        })
        .await?;
        Ok(self.wait(rx).await??)
    }

    pub async fn submit_action(
        &self,
        connection: ConnectionId,
        table_id: TableId,
        action: ActionType,
        amount: Chips,
    ) -> Result<(), EngineError> {
        let (respond, rx) = oneshot::channel();
        self.send(InboundEvent::SubmitAction {
            connection,
            table_id,
            action,
            amount,
            respond,
        })
        .await?;
        Ok(self.wait(rx).await??)
    }

    async fn send(&self, event: InboundEvent) -> Result<(), EngineError> {
        self.inbound
            .send(event)
            .await
            .map_err(|_| EngineError::Closed)
    }

    async fn wait<T>(&self, rx: oneshot::Receiver<T>) -> Result<T, EngineError> {
        rx.await.map_err(|_| EngineError::Closed)
    }
}
