//! Outbound channel registry: the executing half of the broadcast relay.
//!
//! The room core plans deliveries; this registry executes them. Each
//! live connection registers an unbounded channel that its writer task
//! drains. Delivery is fire-and-forget: no acknowledgment, no retry.
//! A closed or unregistered receiver is silently skipped.

use std::collections::HashMap;

use blockfall_protocol::{ClientId, ServerMessage};
use blockfall_room::Delivery;
use tokio::sync::mpsc;

pub(crate) struct ClientRelay {
    senders: HashMap<ClientId, mpsc::UnboundedSender<ServerMessage>>,
}

impl ClientRelay {
    pub(crate) fn new() -> Self {
        Self {
            senders: HashMap::new(),
        }
    }

    /// Registers a connection's outbound channel, returning the receiving
    /// end for its writer task.
    pub(crate) fn register(
        &mut self,
        client: ClientId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(client, tx);
        rx
    }

    /// Forgets a connection. Its writer task ends when the sender drops.
    pub(crate) fn unregister(&mut self, client: ClientId) {
        self.senders.remove(&client);
    }

    /// Executes a delivery plan, silently dropping messages to absent or
    /// closed receivers.
    pub(crate) fn deliver(&self, deliveries: Vec<Delivery>) {
        for d in deliveries {
            if let Some(tx) = self.senders.get(&d.to) {
                let _ = tx.send(d.msg);
            }
        }
    }
}
