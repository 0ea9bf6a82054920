//! Core protocol types for the tabletop wire format.
//!
//! Server → client traffic is one of two shapes, distinguished by the
//! `type` field:
//!
//! ```text
//! { "type": "event", "seq": 3, "event_id": "…", "event_type": "CHAT", "payload": {…} }
//! { "type": "error", "message": "…" }
//! ```
//!
//! Client → server traffic is a [`ClientCommand`].

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A client-chosen identifier naming a logical participant.
///
/// The server never assigns these; a client keeps the same one across
/// reconnects. Serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wraps a raw identifier. Emptiness is checked by the validator,
    /// not here.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lets maps keyed by `ClientId` be queried with a plain `&str`.
impl Borrow<str> for ClientId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// EventType
// ---------------------------------------------------------------------------

/// The five command kinds the server understands.
///
/// An accepted command produces an event of the same name, so this enum
/// doubles as the `event_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Join,
    Chat,
    RollDice,
    MoveToken,
    SetHp,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        Self::Join,
        Self::Chat,
        Self::RollDice,
        Self::MoveToken,
        Self::SetHp,
    ];

    /// The wire name, e.g. `"ROLL_DICE"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "JOIN",
            Self::Chat => "CHAT",
            Self::RollDice => "ROLL_DICE",
            Self::MoveToken => "MOVE_TOKEN",
            Self::SetHp => "SET_HP",
        }
    }

    /// Looks up a command by its wire name. Matching is case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Command-specific body of an [`Event`].
///
/// Serialized without a tag: the enclosing event already carries
/// `event_type`, and every variant has a distinct set of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    Join {
        client_id: ClientId,
        name: String,
    },
    Chat {
        client_id: ClientId,
        text: String,
    },
    RollDice {
        client_id: ClientId,
        sides: u32,
        result: u32,
    },
    MoveToken {
        token_id: String,
        x: i64,
        y: i64,
    },
    SetHp {
        target_id: ClientId,
        delta: i64,
        new_hp: i64,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Join { .. } => EventType::Join,
            Self::Chat { .. } => EventType::Chat,
            Self::RollDice { .. } => EventType::RollDice,
            Self::MoveToken { .. } => EventType::MoveToken,
            Self::SetHp { .. } => EventType::SetHp,
        }
    }
}

/// A sequenced record of one accepted command.
///
/// Immutable once built: the fields are private and `event_type` is
/// always derived from the payload, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    seq: u64,
    event_id: String,
    event_type: EventType,
    payload: EventPayload,
}

impl Event {
    pub fn new(seq: u64, event_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            seq,
            event_id: event_id.into(),
            event_type: payload.event_type(),
            payload,
        }
    }

    /// Global position of this event; the first event is 1.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The request identifier echoed from the originating command.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }
}

/// Everything the server ever sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Broadcast to every registered connection.
    Event(Event),

    /// Sent only to the connection whose message was rejected.
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl From<Event> for ServerMessage {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// The command envelope a client sends.
///
/// The server never deserializes into this type directly (it validates an
/// untyped value instead, see [`crate::validate_envelope`]); it exists so
/// clients and tests can build well-formed messages.
///
/// `#[serde(tag = "type", rename = "command")]` adds `"type": "command"`
/// to the serialized object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "command")]
pub struct ClientCommand {
    pub client_id: ClientId,
    pub event_id: String,
    pub command: String,
    pub payload: Value,
}

impl ClientCommand {
    pub fn new(
        client_id: impl Into<ClientId>,
        event_id: impl Into<String>,
        command: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            event_id: event_id.into(),
            command: command.into(),
            payload,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
