//! Envelope validation: the shape check that runs before any command
//! semantics.
//!
//! Validation stops at the first violated rule, checked in wire order:
//! object → `type` → `client_id` → `event_id` → `command` → `payload`.

use serde_json::{Map, Value};

use crate::{ClientId, EnvelopeError};

/// A command envelope that passed [`validate_envelope`].
///
/// `client_id`, `event_id` and `command` are guaranteed non-empty and
/// `payload` is guaranteed to be an object (possibly empty). Whether the
/// command name is known, and whether the payload fields fit it, is the
/// engine's business.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    pub client_id: ClientId,
    pub event_id: String,
    pub command: String,
    pub payload: Map<String, Value>,
}

/// Checks that a decoded message is a well-formed command envelope.
///
/// # Errors
/// Returns the first [`EnvelopeError`] encountered.
pub fn validate_envelope(value: Value) -> Result<CommandEnvelope, EnvelopeError> {
    let Value::Object(mut obj) = value else {
        return Err(EnvelopeError::NotAnObject);
    };

    if obj.get("type").and_then(Value::as_str) != Some("command") {
        return Err(EnvelopeError::WrongType);
    }

    let client_id =
        take_non_empty_string(&mut obj, "client_id").ok_or(EnvelopeError::InvalidClientId)?;
    let event_id =
        take_non_empty_string(&mut obj, "event_id").ok_or(EnvelopeError::InvalidEventId)?;
    let command =
        take_non_empty_string(&mut obj, "command").ok_or(EnvelopeError::InvalidCommand)?;

    let payload = match obj.remove("payload") {
        Some(Value::Object(payload)) => payload,
        _ => return Err(EnvelopeError::InvalidPayload),
    };

    Ok(CommandEnvelope {
        client_id: ClientId::new(client_id),
        event_id,
        command,
        payload,
    })
}

fn take_non_empty_string(obj: &mut Map<String, Value>, key: &str) -> Option<String> {
    match obj.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}
