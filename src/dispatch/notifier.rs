//! The notifier worker: owns every connection's sink and never blocks.
//!
//! Delivery is `try_send` only. A full sink costs that connection one
//! notification (logged, not retried); a closed sink gets the connection
//! pruned. Neither outcome ever stalls the game worker or touches table
//! state.

use log::{debug, warn};
use std::collections::HashMap;
use tokio::sync::mpsc;

use super::outbound::{Notification, OutboundEvent};
use crate::table::ConnectionId;

pub(super) struct Notifier {
    outbox: mpsc::Receiver<OutboundEvent>,
    sinks: HashMap<ConnectionId, mpsc::Sender<Notification>>,
}

impl Notifier {
    pub(super) fn new(outbox: mpsc::Receiver<OutboundEvent>) -> Self {
        Self {
            outbox,
            sinks: HashMap::new(),
        }
    }

    pub(super) async fn run(mut self) {
        debug!("notifier worker started");
        while let Some(event) = self.outbox.recv().await {
            match event {
                OutboundEvent::Register { connection, sink } => {
                    self.sinks.insert(connection, sink);
                }
                OutboundEvent::Unregister { connection } => {
                    self.sinks.remove(&connection);
                }
                OutboundEvent::Deliver {
                    connection,
                    payload,
                } => self.deliver(connection, payload),
            }
        }
        debug!("notifier worker stopped");
    }

    fn deliver(&mut self, connection: ConnectionId, payload: Notification) {
        let Some(sink) = self.sinks.get(&connection) else {
            debug!("connection {connection} is gone, dropping a notification");
            return;
        };
        match sink.try_send(payload) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("connection {connection} is slow, dropping a notification");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("connection {connection} closed its sink, removing it");
                self.sinks.remove(&connection);
            }
        }
    }
}
