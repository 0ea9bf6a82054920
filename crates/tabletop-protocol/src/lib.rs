//! Wire protocol for the tabletop server.
//!
//! This crate defines the messages that clients and the server exchange:
//!
//! - **Types** ([`ServerMessage`], [`Event`], [`EventPayload`],
//!   [`ClientCommand`]): the structures that travel on the wire.
//! - **Validation** ([`validate_envelope`], [`CommandEnvelope`]): the
//!   shape check every inbound message passes before the engine sees it.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`], [`EnvelopeError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (CommandEnvelope) → Engine (Event)
//! ```
//!
//! Inbound commands decode into an untyped [`serde_json::Value`] first so
//! that the validator can name the first field that is wrong, instead of
//! surfacing a generic deserialization error.

mod codec;
mod error;
mod types;
mod validate;

pub use codec::{Codec, JsonCodec};
pub use error::{EnvelopeError, ProtocolError};
pub use types::{
    ClientCommand, ClientId, Event, EventPayload, EventType, ServerMessage,
};
pub use validate::{CommandEnvelope, validate_envelope};

/// Re-exported so downstream crates agree on the payload map type.
pub use serde_json::{Map, Value};
