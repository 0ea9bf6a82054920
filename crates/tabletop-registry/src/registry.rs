//! The connection registry: who is listening, under which client id.

use std::collections::HashMap;

use tabletop_protocol::ClientId;
use tabletop_transport::ConnectionId;

use crate::{Outbound, Peer};

/// Summary of one [`ConnectionRegistry::broadcast`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers that accepted the message.
    pub delivered: usize,
    /// Client ids whose peer failed and was removed.
    pub pruned: Vec<ClientId>,
}

/// Maps each client id to its currently active connection.
///
/// Not synchronized. The table actor owns it exclusively.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    peers: HashMap<ClientId, Peer>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points `client_id` at `peer`, replacing any previous connection.
    ///
    /// The displaced peer, if any, is returned and is not notified.
    pub fn register(&mut self, client_id: ClientId, peer: Peer) -> Option<Peer> {
        let conn_id = peer.conn_id();
        let previous = self.peers.insert(client_id.clone(), peer);
        match &previous {
            Some(old) if old.conn_id() != conn_id => {
                tracing::info!(
                    %client_id,
                    old = %old.conn_id(),
                    new = %conn_id,
                    "registration moved to newer connection"
                );
            }
            Some(_) => {}
            None => tracing::info!(%client_id, %conn_id, "client registered"),
        }
        previous
    }

    /// Removes the mapping only if it still points at `conn_id`.
    ///
    /// A connection that was displaced by a newer one for the same client
    /// id calls this on close and must not evict the newer one. Returns
    /// `true` if a mapping was removed.
    pub fn unregister_if_current(&mut self, client_id: &ClientId, conn_id: ConnectionId) -> bool {
        let is_current = self
            .peers
            .get(client_id)
            .is_some_and(|peer| peer.conn_id() == conn_id);
        if is_current {
            self.peers.remove(client_id);
            tracing::info!(%client_id, %conn_id, "client unregistered");
        }
        is_current
    }

    /// Delivers `data` to every registered peer.
    ///
    /// A peer that fails is removed and delivery continues with the rest.
    pub fn broadcast(&mut self, data: Outbound) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for (client_id, peer) in &self.peers {
            if peer.deliver(Outbound::clone(&data)) {
                report.delivered += 1;
            } else {
                report.pruned.push(client_id.clone());
            }
        }

        for client_id in &report.pruned {
            if let Some(peer) = self.peers.remove(client_id) {
                tracing::warn!(%client_id, conn_id = %peer.conn_id(), "pruned unreachable peer");
            }
        }

        report
    }

    /// Delivers `data` to one client. A failing peer is removed.
    ///
    /// Returns `false` if the client is unknown or its peer failed.
    pub fn send_to(&mut self, client_id: &ClientId, data: Outbound) -> bool {
        let Some(peer) = self.peers.get(client_id) else {
            return false;
        };
        if peer.deliver(data) {
            return true;
        }
        if let Some(peer) = self.peers.remove(client_id) {
            tracing::warn!(%client_id, conn_id = %peer.conn_id(), "pruned unreachable peer");
        }
        false
    }

    pub fn peer(&self, client_id: &str) -> Option<&Peer> {
        self.peers.get(client_id)
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.peers.contains_key(client_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
