//! Table actor: the single task that owns all shared state.
//!
//! Every command from every connection goes through one `mpsc` channel
//! into this actor, which processes them one at a time. That is the whole
//! concurrency story: dedup-check, seq reservation, state mutation and
//! fan-out for one command finish before the next command is looked at,
//! without a lock anywhere.

use rand::Rng;
use tabletop_engine::{CommandProcessor, Outcome};
use tabletop_protocol::{ClientId, Codec, CommandEnvelope, ServerMessage};
use tabletop_registry::{ConnectionRegistry, Peer};
use tabletop_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::TabletopError;

/// Commands sent to the table actor through its channel.
pub(crate) enum TableCommand {
    /// Register `peer` under the envelope's client id, then process it.
    Submit {
        peer: Peer,
        envelope: CommandEnvelope,
    },

    /// A connection closed. Release each client id it registered under,
    /// unless a newer connection has claimed it since.
    Disconnect {
        conn_id: ConnectionId,
        client_ids: Vec<ClientId>,
    },

    /// Request a snapshot of table counters.
    Info { reply: oneshot::Sender<TableInfo> },
}

/// A snapshot of table counters (not the game state itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInfo {
    /// The most recently assigned seq, 0 before the first event.
    pub last_seq: u64,
    /// Registered connections.
    pub connections: usize,
    pub players: usize,
    pub tokens: usize,
}

/// Handle to the running table actor.
///
/// Cheap to clone; every connection handler holds one.
#[derive(Clone)]
pub struct TableHandle {
    sender: mpsc::Sender<TableCommand>,
}

impl TableHandle {
    /// Submits a validated envelope on behalf of `peer`.
    ///
    /// Returns once the command is queued, not once it is processed. The
    /// outcome arrives on the peer's queue (or nowhere, for a duplicate).
    pub async fn submit(&self, peer: Peer, envelope: CommandEnvelope) -> Result<(), TabletopError> {
        self.sender
            .send(TableCommand::Submit { peer, envelope })
            .await
            .map_err(|_| TabletopError::TableUnavailable)
    }

    /// Tells the table that `conn_id` has closed.
    pub async fn disconnect(
        &self,
        conn_id: ConnectionId,
        client_ids: Vec<ClientId>,
    ) -> Result<(), TabletopError> {
        self.sender
            .send(TableCommand::Disconnect {
                conn_id,
                client_ids,
            })
            .await
            .map_err(|_| TabletopError::TableUnavailable)
    }

    /// Requests the current table counters.
    ///
    /// Commands submitted before this call have been processed by the
    /// time it returns.
    pub async fn info(&self) -> Result<TableInfo, TabletopError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(TableCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| TabletopError::TableUnavailable)?;
        reply_rx.await.map_err(|_| TabletopError::TableUnavailable)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct TableActor<C: Codec, R: Rng> {
    processor: CommandProcessor<R>,
    registry: ConnectionRegistry,
    codec: C,
    receiver: mpsc::Receiver<TableCommand>,
}

impl<C: Codec, R: Rng> TableActor<C, R> {
    /// Runs the actor loop until every handle is dropped.
    async fn run(mut self) {
        tracing::info!("table actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                TableCommand::Submit { peer, envelope } => {
                    self.handle_submit(peer, envelope);
                }
                TableCommand::Disconnect {
                    conn_id,
                    client_ids,
                } => {
                    for client_id in &client_ids {
                        self.registry.unregister_if_current(client_id, conn_id);
                    }
                }
                TableCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
            }
        }

        tracing::info!(
            last_seq = self.processor.ledger().last_seq(),
            "table actor stopped"
        );
    }

    fn handle_submit(&mut self, peer: Peer, envelope: CommandEnvelope) {
        self.registry.register(envelope.client_id.clone(), peer.clone());

        match self.processor.process(&envelope) {
            Outcome::Applied(event) => {
                let seq = event.seq();
                match self.codec.encode(&ServerMessage::from(event)) {
                    Ok(bytes) => {
                        let report = self.registry.broadcast(bytes.into());
                        tracing::trace!(
                            seq,
                            delivered = report.delivered,
                            pruned = report.pruned.len(),
                            "event broadcast"
                        );
                    }
                    Err(e) => {
                        tracing::error!(seq, error = %e, "failed to encode event");
                    }
                }
            }
            Outcome::Duplicate => {}
            Outcome::Rejected(err) => {
                send_error(&peer, &self.codec, &err.to_string());
            }
        }
    }

    fn info(&self) -> TableInfo {
        let state = self.processor.state();
        TableInfo {
            last_seq: self.processor.ledger().last_seq(),
            connections: self.registry.len(),
            players: state.player_count(),
            tokens: state.token_count(),
        }
    }
}

/// Queues an error reply for one peer. A peer that is already gone is
/// ignored.
pub(crate) fn send_error(peer: &Peer, codec: &impl Codec, message: &str) {
    match codec.encode(&ServerMessage::error(message)) {
        Ok(bytes) => {
            if !peer.deliver(bytes.into()) {
                tracing::debug!(conn_id = %peer.conn_id(), "error reply dropped, peer gone");
            }
        }
        Err(e) => tracing::error!(error = %e, "failed to encode error reply"),
    }
}

/// Spawns the table actor and returns a handle to it.
///
/// `queue_size` bounds the command channel; when it is full, submitting
/// connections wait.
pub fn spawn_table<C, R>(processor: CommandProcessor<R>, codec: C, queue_size: usize) -> TableHandle
where
    C: Codec,
    R: Rng + Send + 'static,
{
    let (tx, rx) = mpsc::channel(queue_size.max(1));

    let actor = TableActor {
        processor,
        registry: ConnectionRegistry::new(),
        codec,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    TableHandle { sender: tx }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::{Value, json};
    use tabletop_protocol::{JsonCodec, validate_envelope};
    use tabletop_registry::PeerReceiver;

    use super::*;

    fn table() -> TableHandle {
        spawn_table(
            CommandProcessor::with_rng(StdRng::seed_from_u64(1)),
            JsonCodec,
            16,
        )
    }

    fn envelope(client: &str, event_id: &str, command: &str, payload: Value) -> CommandEnvelope {
        validate_envelope(json!({
            "type": "command",
            "client_id": client,
            "event_id": event_id,
            "command": command,
            "payload": payload,
        }))
        .unwrap()
    }

    fn drain(rx: &mut PeerReceiver) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(bytes) = rx.try_recv() {
            out.push(serde_json::from_slice(&bytes).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_event_reaches_every_registered_peer() {
        let table = table();
        let (a, mut rx_a) = Peer::channel(ConnectionId::new(1));
        let (b, mut rx_b) = Peer::channel(ConnectionId::new(2));

        table
            .submit(a, envelope("a", "1", "JOIN", json!({"name": "Aria"})))
            .await
            .unwrap();
        table
            .submit(b, envelope("b", "1", "JOIN", json!({"name": "Bram"})))
            .await
            .unwrap();
        let info = table.info().await.unwrap();
        assert_eq!(info.last_seq, 2);
        assert_eq!(info.connections, 2);
        assert_eq!(info.players, 2);

        let seen_a: Vec<_> = drain(&mut rx_a).iter().map(|m| m["seq"].clone()).collect();
        let seen_b: Vec<_> = drain(&mut rx_b).iter().map(|m| m["seq"].clone()).collect();
        assert_eq!(seen_a, vec![json!(1), json!(2)]);
        // b registered with its own JOIN, so it only sees from seq 2.
        assert_eq!(seen_b, vec![json!(2)]);
    }

    #[tokio::test]
    async fn test_rejection_goes_only_to_originator() {
        let table = table();
        let (a, mut rx_a) = Peer::channel(ConnectionId::new(1));
        let (b, mut rx_b) = Peer::channel(ConnectionId::new(2));

        table
            .submit(a, envelope("a", "1", "CHAT", json!({"text": "hi"})))
            .await
            .unwrap();
        table
            .submit(b, envelope("b", "1", "ROLL_DICE", json!({"sides": 1})))
            .await
            .unwrap();
        table.info().await.unwrap();

        assert_eq!(drain(&mut rx_a).len(), 1, "a sees its own chat only");
        assert_eq!(
            drain(&mut rx_b),
            vec![json!({
                "type": "error",
                "message": "ROLL_DICE requires payload.sides as integer between 2 and 10000."
            })]
        );
    }

    #[tokio::test]
    async fn test_duplicate_is_silent() {
        let table = table();
        let (a, mut rx_a) = Peer::channel(ConnectionId::new(1));
        let msg = envelope("a", "same", "CHAT", json!({"text": "hi"}));

        for _ in 0..3 {
            table.submit(a.clone(), msg.clone()).await.unwrap();
        }
        let info = table.info().await.unwrap();
        assert_eq!(info.last_seq, 1);
        assert_eq!(drain(&mut rx_a).len(), 1);
    }

    #[tokio::test]
    async fn test_dead_peer_is_pruned_and_others_still_receive() {
        let table = table();
        let (a, mut rx_a) = Peer::channel(ConnectionId::new(1));
        let (b, rx_b) = Peer::channel(ConnectionId::new(2));
        let (c, mut rx_c) = Peer::channel(ConnectionId::new(3));
        for (peer, id) in [(a, "a"), (b, "b"), (c.clone(), "c")] {
            table
                .submit(peer, envelope(id, "join", "JOIN", json!({"name": id})))
                .await
                .unwrap();
        }
        table.info().await.unwrap();
        drain(&mut rx_a);
        drain(&mut rx_c);
        drop(rx_b);

        table
            .submit(
                c,
                envelope("c", "move", "MOVE_TOKEN", json!({"token_id": "t", "x": 1, "y": 2})),
            )
            .await
            .unwrap();
        let info = table.info().await.unwrap();

        assert_eq!(info.connections, 2, "only b is pruned");
        assert_eq!(info.last_seq, 4);
        assert_eq!(drain(&mut rx_a)[0]["event_type"], "MOVE_TOKEN");
        assert_eq!(drain(&mut rx_c)[0]["event_type"], "MOVE_TOKEN");
    }

    #[tokio::test]
    async fn test_stale_disconnect_keeps_newer_registration() {
        let table = table();
        let (old, _rx_old) = Peer::channel(ConnectionId::new(1));
        let (new, mut rx_new) = Peer::channel(ConnectionId::new(2));

        table
            .submit(old, envelope("p", "1", "JOIN", json!({"name": "P"})))
            .await
            .unwrap();
        table
            .submit(new, envelope("p", "2", "CHAT", json!({"text": "back"})))
            .await
            .unwrap();
        table
            .disconnect(ConnectionId::new(1), vec![ClientId::new("p")])
            .await
            .unwrap();
        let info = table.info().await.unwrap();
        assert_eq!(info.connections, 1);

        table
            .submit(
                Peer::channel(ConnectionId::new(3)).0,
                envelope("q", "1", "CHAT", json!({"text": "hello p"})),
            )
            .await
            .unwrap();
        table.info().await.unwrap();
        let seqs: Vec<_> = drain(&mut rx_new).iter().map(|m| m["seq"].clone()).collect();
        assert_eq!(seqs, vec![json!(2), json!(3)]);
    }
}
