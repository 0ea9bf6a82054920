//! Error types for the engine.

use tabletop_protocol::EventType;

/// Why a command was rejected.
///
/// The `Display` text is sent verbatim to the originating connection.
/// A rejected command never consumes a sequence number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("JOIN requires payload.name as non-empty string.")]
    InvalidName,

    #[error("CHAT requires payload.text as non-empty string.")]
    InvalidText,

    #[error("ROLL_DICE requires payload.sides as integer between 2 and 10000.")]
    InvalidSides,

    #[error("MOVE_TOKEN requires payload.token_id as non-empty string.")]
    InvalidTokenId,

    #[error("MOVE_TOKEN requires payload.x and payload.y as integers.")]
    InvalidCoordinates,

    #[error("SET_HP requires payload.target_id as non-empty string.")]
    InvalidTarget,

    #[error("SET_HP requires payload.delta as integer.")]
    InvalidDelta,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl CommandError {
    /// The command kind this error belongs to, if it was a known one.
    pub fn command(&self) -> Option<EventType> {
        match self {
            Self::InvalidName => Some(EventType::Join),
            Self::InvalidText => Some(EventType::Chat),
            Self::InvalidSides => Some(EventType::RollDice),
            Self::InvalidTokenId | Self::InvalidCoordinates => Some(EventType::MoveToken),
            Self::InvalidTarget | Self::InvalidDelta => Some(EventType::SetHp),
            Self::UnknownCommand(_) => None,
        }
    }
}
