//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, truncated messages, or bytes that
    /// are not UTF-8 at all.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

/// The first rule an inbound command envelope violates.
///
/// The `Display` text is exactly what the client receives in the
/// `message` field of the error reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Message must be a JSON object.")]
    NotAnObject,

    #[error("Expected type='command'.")]
    WrongType,

    #[error("Missing/invalid client_id.")]
    InvalidClientId,

    #[error("Missing/invalid event_id.")]
    InvalidEventId,

    #[error("Missing/invalid command.")]
    InvalidCommand,

    #[error("Missing/invalid payload (must be object).")]
    InvalidPayload,
}
