//! Connection registry and broadcast fan-out.
//!
//! The registry maps each [`ClientId`](tabletop_protocol::ClientId) to the
//! one connection currently speaking for it, and delivers pre-encoded
//! bytes to those connections.
//!
//! # How it fits in the stack
//!
//! ```text
//! Table actor (above)  ← owns the registry next to the command processor
//!     ↕
//! Registry (this crate) ← client_id → Peer, last registration wins
//!     ↕
//! Peer queue → writer task → Connection::send
//! ```
//!
//! Delivery never touches a socket directly: each [`Peer`] is the sending
//! half of an unbounded queue drained by that connection's writer task.
//! A peer whose writer has gone away fails to accept new data, and that
//! failure is what prunes it from the registry.

mod peer;
mod registry;

pub use peer::{Outbound, Peer, PeerReceiver};
pub use registry::{BroadcastReport, ConnectionRegistry};
