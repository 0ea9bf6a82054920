//! Per-connection handler: decode, validate, forward to the table.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that drains the connection's outbound queue:
//!
//! ```text
//!   recv ─→ decode ─→ validate ─→ TableHandle::submit
//!             │err       │err
//!             └──────────┴──→ error reply on own queue
//!
//!   outbound queue ─→ writer task ─→ Connection::send
//! ```
//!
//! Undecodable bytes and malformed envelopes are answered here without
//! involving the table, so they can never consume a seq or a dedup entry.

use std::sync::Arc;

use tabletop_protocol::{ClientId, Codec, Value, validate_envelope};
use tabletop_registry::{Peer, PeerReceiver};
use tabletop_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::server::ServerState;
use crate::table::{TableHandle, send_error};
use crate::TabletopError;

/// Reply to bytes that are not JSON at all.
pub const INVALID_JSON: &str = "Invalid JSON.";

/// Drop guard that releases a connection's registrations when the
/// handler exits.
///
/// This runs even if the handler returns early with an error. Since
/// `Drop` is synchronous, we spawn a fire-and-forget task to reach the
/// table.
struct RegistrationGuard {
    conn_id: ConnectionId,
    client_ids: Vec<ClientId>,
    table: TableHandle,
}

impl RegistrationGuard {
    /// Remembers that this connection has registered under `client_id`.
    fn track(&mut self, client_id: &ClientId) {
        if !self.client_ids.contains(client_id) {
            self.client_ids.push(client_id.clone());
        }
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        let client_ids = std::mem::take(&mut self.client_ids);
        if client_ids.is_empty() {
            return;
        }
        let conn_id = self.conn_id;
        let table = self.table.clone();
        tokio::spawn(async move {
            let _ = table.disconnect(conn_id, client_ids).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), TabletopError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, "connection opened");

    let (peer, outbound) = Peer::channel(conn_id);
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), outbound));

    let mut guard = RegistrationGuard {
        conn_id,
        client_ids: Vec::new(),
        table: state.table.clone(),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let value: Value = match state.codec.decode(&data) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "undecodable message");
                send_error(&peer, &state.codec, INVALID_JSON);
                continue;
            }
        };

        let envelope = match validate_envelope(value) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(%conn_id, reason = %e, "invalid envelope");
                send_error(&peer, &state.codec, &e.to_string());
                continue;
            }
        };

        guard.track(&envelope.client_id);
        state.table.submit(peer.clone(), envelope).await?;
    }

    // Nobody is reading any more; anything still queued has no audience.
    writer.abort();
    // guard drops here → registrations released.
    Ok(())
}

/// Drains a connection's outbound queue into its socket.
///
/// Stops at the first failed send. Dropping `outbound` then makes every
/// later delivery to this peer fail, which prunes it from the registry.
async fn write_loop(conn: Arc<WebSocketConnection>, mut outbound: PeerReceiver) {
    while let Some(data) = outbound.recv().await {
        if let Err(e) = conn.send(&data).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, writer stopping");
            break;
        }
    }
}
