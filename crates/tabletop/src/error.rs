//! Unified error type for the tabletop server.

use tabletop_protocol::ProtocolError;
use tabletop_transport::TransportError;

/// Top-level error that wraps the per-crate errors.
///
/// Command and envelope rejections are not errors at this level: they
/// are replies to a client. What remains is what can end a connection
/// task or stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum TabletopError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The table actor has stopped and no longer accepts commands.
    #[error("table is unavailable")]
    TableUnavailable,
}
