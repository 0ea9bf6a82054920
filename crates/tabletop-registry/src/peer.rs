//! The per-connection outbound queue.

use std::sync::Arc;

use tabletop_transport::ConnectionId;
use tokio::sync::mpsc;

/// One encoded server message. Shared, so a broadcast encodes once and
/// every recipient queue holds the same allocation.
pub type Outbound = Arc<[u8]>;

/// The half of a peer queue that a connection's writer task drains.
pub type PeerReceiver = mpsc::UnboundedReceiver<Outbound>;

/// A handle for delivering messages to one live connection.
///
/// Cheap to clone. Identity is the [`ConnectionId`], not the client id:
/// two peers for the same client are different peers.
#[derive(Debug, Clone)]
pub struct Peer {
    conn_id: ConnectionId,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl Peer {
    /// Creates a peer for `conn_id` and the receiver its writer task
    /// should drain.
    pub fn channel(conn_id: ConnectionId) -> (Self, PeerReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { conn_id, sender }, receiver)
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    /// Queues `data` for this connection.
    ///
    /// Returns `false` if the connection's writer is gone; the data is
    /// dropped.
    pub fn deliver(&self, data: Outbound) -> bool {
        self.sender.send(data).is_ok()
    }

    /// Returns `true` once the writer side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
