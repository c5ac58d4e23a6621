//! The game worker: the single writer over all table state.
//!
//! One task owns the registry, the connection/identity bindings, and the
//! table memberships. It drains the inbound channel in arrival order and
//! dispatches with one exhaustive `match`, so every mutation of any table
//! happens here and nowhere else. After each operation the touched table's
//! buffered events are routed onto the outbound channel; observer lists are
//! copied out before routing so delivery never holds a borrow into the
//! registry.

use log::{debug, info, warn};
use std::collections::HashMap;
use tokio::sync::mpsc;

use super::events::{InboundEvent, OpError};
use super::outbound::{Notification, OutboundEvent};
use crate::game::entities::{ActionType, Chips, SeatNumber, TableId, User, UserId};
use crate::table::{
    ConnectionId, Recipients, Registry, Table, TableAction, TableConfig, TableEvent, TableSnapshot,
};

pub(super) struct GameWorker {
    inbox: mpsc::Receiver<InboundEvent>,
    outbound: mpsc::Sender<OutboundEvent>,
    registry: Registry,
    /// Connection -> authenticated user.
    identities: HashMap<ConnectionId, User>,
    /// User -> the connection currently receiving their personalized
    /// payloads. Re-authentication replaces the binding.
    connections: HashMap<UserId, ConnectionId>,
    /// Connection -> the one table it observes.
    memberships: HashMap<ConnectionId, TableId>,
}

/// Copy out everything routing needs so the registry borrow can end first.
fn take_routable(table: &mut Table) -> (Vec<ConnectionId>, Vec<TableEvent>) {
    let observers = table.observers().copied().collect();
    (observers, table.drain_events())
}

impl GameWorker {
    pub(super) fn new(
        inbox: mpsc::Receiver<InboundEvent>,
        outbound: mpsc::Sender<OutboundEvent>,
    ) -> Self {
        Self {
            inbox,
            outbound,
            registry: Registry::new(),
            identities: HashMap::new(),
            connections: HashMap::new(),
            memberships: HashMap::new(),
        }
    }

    pub(super) async fn run(mut self) {
        info!("game worker started");
        while let Some(event) = self.inbox.recv().await {
            self.handle(event).await;
        }
        info!("game worker stopped");
    }

    async fn handle(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::Connected { connection, sink } => {
                debug!("connection {connection} opened");
                self.push(OutboundEvent::Register { connection, sink }).await;
            }
            InboundEvent::Authenticated { connection, user } => {
                if let Some(previous) = self.connections.insert(user.id, connection) {
                    if previous != connection {
                        info!("{user} re-authenticated, routing moves to {connection}");
                    }
                }
                self.identities.insert(connection, user);
            }
            InboundEvent::Disconnected { connection } => {
                self.handle_disconnect(connection).await;
            }
            InboundEvent::CreateTable { config, respond } => {
                let result = self.handle_create(config);
                let _ = respond.send(result);
            }
            InboundEvent::DeleteTable { table_id, respond } => {
                let result = self.handle_delete(table_id).await;
                let _ = respond.send(result);
            }
            InboundEvent::ListTables { respond } => {
                let _ = respond.send(self.registry.list());
            }
            InboundEvent::JoinTable {
                connection,
                table_id,
                respond,
            } => {
                let result = self.handle_join_table(connection, table_id).await;
                if let Err(err) = &result {
                    self.report(connection, &err.clone().into()).await;
                }
                let _ = respond.send(result);
            }
            InboundEvent::LeaveTable {
                connection,
                respond,
            } => {
                let result = self.handle_leave_table(connection).await;
                if let Err(err) = &result {
                    self.report(connection, err).await;
                }
                let _ = respond.send(result);
            }
            InboundEvent::TakeSeat {
                connection,
                table_id,
                seat_number,
                buy_in,
                respond,
            } => {
                let result = self
                    .handle_take_seat(connection, table_id, seat_number, buy_in)
                    .await;
                if let Err(err) = &result {
                    self.report(connection, err).await;
                }
                let _ = respond.send(result);
            }
            InboundEvent::LeaveSeat {
                connection,
                table_id,
                seat_number,
                respond,
            } => {
                let result = self
                    .handle_leave_seat(connection, table_id, seat_number)
                    .await;
                if let Err(err) = &result {
                    self.report(connection, err).await;
                }
                let _ = respond.send(result);
            }
            InboundEvent::JoinWaitlist {
                connection,
                table_id,
                buy_in,
                respond,
            } => {
                let result = self
                    .handle_join_waitlist(connection, table_id, buy_in)
                    .await;
                if let Err(err) = &result {
                    self.report(connection, err).await;
                }
                let _ = respond.send(result);
            }
            InboundEvent::SubmitAction {
                connection,
                table_id,
                action,
                amount,
                respond,
            } => {
                let result = self
                    .handle_submit_action(connection, table_id, action, amount)
                    .await;
                if let Err(err) = &result {
                    self.report(connection, err).await;
                }
                let _ = respond.send(result);
            }
        }
    }

    fn handle_create(
        &mut self,
        config: TableConfig,
    ) -> Result<TableSnapshot, crate::table::TableError> {
        let table = self.registry.create(config)?;
        Ok(table.snapshot())
    }

    async fn handle_delete(
        &mut self,
        table_id: TableId,
    ) -> Result<(), crate::table::TableError> {
        let mut table = self.registry.delete(table_id)?;
        let (observers, _) = take_routable(&mut table);
        let farewell = Notification::TableUpdate {
            action: TableAction::Deleted,
            table: table.snapshot(),
        };
        for connection in observers {
            self.deliver(connection, farewell.clone()).await;
        }
        self.memberships.retain(|_, tid| *tid != table_id);
        Ok(())
    }

    async fn handle_join_table(
        &mut self,
        connection: ConnectionId,
        table_id: TableId,
    ) -> Result<TableSnapshot, crate::table::TableError> {
        // Resolve the target before touching the current membership: a bad
        // table id must leave the caller where they were.
        self.registry.get(table_id)?;
        // One table per connection: joining another leaves the first.
        if self.memberships.get(&connection) != Some(&table_id) {
            let _ = self.handle_leave_table(connection).await;
        }
        let table = self.registry.get_mut(table_id)?;
        table.join_observer(connection);
        let snapshot = table.snapshot();
        let (observers, events) = take_routable(table);
        self.memberships.insert(connection, table_id);
        self.route(&observers, events).await;
        Ok(snapshot)
    }

    async fn handle_leave_table(&mut self, connection: ConnectionId) -> Result<(), OpError> {
        let table_id = self
            .memberships
            .remove(&connection)
            .ok_or(OpError::NotAtTable)?;
        // The table may have been deleted since the connection joined it.
        if let Ok(table) = self.registry.get_mut(table_id) {
            table.leave_observer(connection);
            let (observers, events) = take_routable(table);
            self.route(&observers, events).await;
        }
        Ok(())
    }

    async fn handle_take_seat(
        &mut self,
        connection: ConnectionId,
        table_id: TableId,
        seat_number: SeatNumber,
        buy_in: Chips,
    ) -> Result<(), OpError> {
        let user = self.identity(connection)?;
        let table = self.registry.get_mut(table_id).map_err(OpError::from)?;
        let result = table
            .take_seat(seat_number, user, buy_in)
            .map_err(OpError::from);
        let (observers, events) = take_routable(table);
        self.route(&observers, events).await;
        result
    }

    async fn handle_leave_seat(
        &mut self,
        connection: ConnectionId,
        table_id: TableId,
        seat_number: SeatNumber,
    ) -> Result<Chips, OpError> {
        let user = self.identity(connection)?;
        let table = self.registry.get_mut(table_id).map_err(OpError::from)?;
        let result = table
            .leave_seat(seat_number, user.id)
            .map_err(OpError::from);
        let (observers, events) = take_routable(table);
        self.route(&observers, events).await;
        result
    }

    async fn handle_join_waitlist(
        &mut self,
        connection: ConnectionId,
        table_id: TableId,
        buy_in: Chips,
    ) -> Result<(), OpError> {
        let user = self.identity(connection)?;
        let table = self.registry.get_mut(table_id).map_err(OpError::from)?;
        let result = table.join_waitlist(user, buy_in).map_err(OpError::from);
        let (observers, events) = take_routable(table);
        self.route(&observers, events).await;
        result
    }

    async fn handle_submit_action(
        &mut self,
        connection: ConnectionId,
        table_id: TableId,
        action: ActionType,
        amount: Chips,
    ) -> Result<(), OpError> {
        let user = self.identity(connection)?;
        let table = self.registry.get_mut(table_id).map_err(OpError::from)?;
        let result = table
            .submit_action(user.id, action, amount)
            .map_err(OpError::from);
        let (observers, events) = take_routable(table);
        self.route(&observers, events).await;
        result
    }

    /// A connection closed: unbind its sink and identity, leave its table,
    /// and vacate any seats its user held anywhere. This runs as its own
    /// inbound event, so it never interrupts another action in flight.
    async fn handle_disconnect(&mut self, connection: ConnectionId) {
        debug!("connection {connection} closed");
        self.push(OutboundEvent::Unregister { connection }).await;
        let _ = self.handle_leave_table(connection).await;

        let Some(user) = self.identities.remove(&connection) else {
            return;
        };
        // A newer connection may have taken over this identity; only the
        // current binding folds the user out.
        if self.connections.get(&user.id) != Some(&connection) {
            return;
        }
        self.connections.remove(&user.id);

        let mut routable = Vec::new();
        for table in self.registry.iter_mut() {
            table.evict_user(user.id);
            routable.push(take_routable(table));
        }
        for (observers, events) in routable {
            self.route(&observers, events).await;
        }
    }

    fn identity(&self, connection: ConnectionId) -> Result<User, OpError> {
        self.identities
            .get(&connection)
            .cloned()
            .ok_or(OpError::NotAuthenticated)
    }

    /// Fan buffered table events out to the outbound channel.
    async fn route(&self, observers: &[ConnectionId], events: Vec<TableEvent>) {
        for TableEvent { to, payload } in events {
            match to {
                Recipients::Observers => {
                    for &connection in observers {
                        self.deliver(connection, payload.clone()).await;
                    }
                }
                Recipients::User(user_id) => match self.connections.get(&user_id) {
                    Some(&connection) => self.deliver(connection, payload).await,
                    None => {
                        debug!("user {user_id} has no connection, dropping a personalized payload");
                    }
                },
            }
        }
    }

    /// Tell the originating connection, and only it, that its request
    /// failed.
    async fn report(&self, connection: ConnectionId, err: &OpError) {
        self.deliver(
            connection,
            Notification::Error {
                message: err.to_string(),
            },
        )
        .await;
    }

    async fn deliver(&self, connection: ConnectionId, payload: Notification) {
        self.push(OutboundEvent::Deliver {
            connection,
            payload,
        })
        .await;
    }

    async fn push(&self, event: OutboundEvent) {
        if self.outbound.send(event).await.is_err() {
            warn!("notifier is gone, dropping an outbound event");
        }
    }
}
