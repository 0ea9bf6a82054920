//! Typed commands, parsed out of an envelope's untyped payload.

use tabletop_protocol::{ClientId, EventType, Map, Value};

use crate::CommandError;

/// Fewest sides a die may have.
pub const MIN_SIDES: u32 = 2;

/// Most sides a die may have.
pub const MAX_SIDES: u32 = 10_000;

/// One validated command, ready to apply.
///
/// Every field has already passed its domain check, so applying a
/// `Command` cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `name` is already trimmed.
    Join { name: String },
    /// `text` is the original, untrimmed string.
    Chat { text: String },
    RollDice { sides: u32 },
    MoveToken { token_id: String, x: i64, y: i64 },
    SetHp { target_id: ClientId, delta: i64 },
}

impl Command {
    /// Resolves a command name and validates its payload.
    ///
    /// Fields are checked in a fixed order per command and the first
    /// failure is returned.
    ///
    /// # Errors
    /// [`CommandError::UnknownCommand`] if `command` is not one of the five
    /// known names, otherwise the specific field error.
    pub fn parse(command: &str, payload: &Map<String, Value>) -> Result<Self, CommandError> {
        let Some(kind) = EventType::from_name(command) else {
            return Err(CommandError::UnknownCommand(command.to_owned()));
        };

        match kind {
            EventType::Join => {
                let name = string_field(payload, "name")
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or(CommandError::InvalidName)?;
                Ok(Self::Join {
                    name: name.to_owned(),
                })
            }
            EventType::Chat => {
                let text = string_field(payload, "text")
                    .filter(|text| !text.trim().is_empty())
                    .ok_or(CommandError::InvalidText)?;
                Ok(Self::Chat {
                    text: text.to_owned(),
                })
            }
            EventType::RollDice => {
                let sides = integer_field(payload, "sides")
                    .and_then(|sides| u32::try_from(sides).ok())
                    .filter(|sides| (MIN_SIDES..=MAX_SIDES).contains(sides))
                    .ok_or(CommandError::InvalidSides)?;
                Ok(Self::RollDice { sides })
            }
            EventType::MoveToken => {
                let token_id = non_empty_field(payload, "token_id")
                    .ok_or(CommandError::InvalidTokenId)?;
                let (Some(x), Some(y)) =
                    (integer_field(payload, "x"), integer_field(payload, "y"))
                else {
                    return Err(CommandError::InvalidCoordinates);
                };
                Ok(Self::MoveToken {
                    token_id: token_id.to_owned(),
                    x,
                    y,
                })
            }
            EventType::SetHp => {
                let target_id = non_empty_field(payload, "target_id")
                    .ok_or(CommandError::InvalidTarget)?;
                let delta = integer_field(payload, "delta").ok_or(CommandError::InvalidDelta)?;
                Ok(Self::SetHp {
                    target_id: ClientId::new(target_id),
                    delta,
                })
            }
        }
    }

    pub fn kind(&self) -> EventType {
        match self {
            Self::Join { .. } => EventType::Join,
            Self::Chat { .. } => EventType::Chat,
            Self::RollDice { .. } => EventType::RollDice,
            Self::MoveToken { .. } => EventType::MoveToken,
            Self::SetHp { .. } => EventType::SetHp,
        }
    }
}

fn string_field<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

fn non_empty_field<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    string_field(payload, key).filter(|s| !s.is_empty())
}

/// A JSON integer that fits in `i64`. Floats (even `3.0`), booleans, and
/// numeric strings are not integers.
fn integer_field(payload: &Map<String, Value>, key: &str) -> Option<i64> {
    payload.get(key).and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(command: &str, payload: Value) -> Result<Command, CommandError> {
        let Value::Object(map) = payload else {
            panic!("test payload must be an object");
        };
        Command::parse(command, &map)
    }

    #[test]
    fn test_join_trims_name() {
        assert_eq!(
            parse("JOIN", json!({"name": "  Aria  "})),
            Ok(Command::Join {
                name: "Aria".into()
            })
        );
    }

    #[test]
    fn test_join_rejects_blank_or_missing_name() {
        assert_eq!(parse("JOIN", json!({"name": "  "})), Err(CommandError::InvalidName));
        assert_eq!(parse("JOIN", json!({"name": 5})), Err(CommandError::InvalidName));
        assert_eq!(parse("JOIN", json!({})), Err(CommandError::InvalidName));
    }

    #[test]
    fn test_chat_keeps_original_text() {
        assert_eq!(
            parse("CHAT", json!({"text": " hi there "})),
            Ok(Command::Chat {
                text: " hi there ".into()
            })
        );
        assert_eq!(parse("CHAT", json!({"text": "\t\n"})), Err(CommandError::InvalidText));
    }

    #[test]
    fn test_roll_dice_bounds() {
        assert_eq!(
            parse("ROLL_DICE", json!({"sides": 2})),
            Ok(Command::RollDice { sides: 2 })
        );
        assert_eq!(
            parse("ROLL_DICE", json!({"sides": 10000})),
            Ok(Command::RollDice { sides: 10_000 })
        );
        for bad in [json!(1), json!(10001), json!(-6), json!(0)] {
            assert_eq!(
                parse("ROLL_DICE", json!({"sides": bad})),
                Err(CommandError::InvalidSides)
            );
        }
    }

    #[test]
    fn test_roll_dice_rejects_non_integers() {
        for bad in [json!(6.0), json!("6"), json!(true), json!(null)] {
            assert_eq!(
                parse("ROLL_DICE", json!({"sides": bad})),
                Err(CommandError::InvalidSides)
            );
        }
    }

    #[test]
    fn test_move_token_checks_id_before_coordinates() {
        assert_eq!(
            parse("MOVE_TOKEN", json!({"token_id": "", "x": "a"})),
            Err(CommandError::InvalidTokenId)
        );
        assert_eq!(
            parse("MOVE_TOKEN", json!({"token_id": "orc", "x": 1})),
            Err(CommandError::InvalidCoordinates)
        );
        assert_eq!(
            parse("MOVE_TOKEN", json!({"token_id": "orc", "x": 1, "y": 2.5})),
            Err(CommandError::InvalidCoordinates)
        );
        assert_eq!(
            parse("MOVE_TOKEN", json!({"token_id": "orc", "x": -1, "y": 2})),
            Ok(Command::MoveToken {
                token_id: "orc".into(),
                x: -1,
                y: 2
            })
        );
    }

    #[test]
    fn test_set_hp_fields() {
        assert_eq!(
            parse("SET_HP", json!({"delta": -3})),
            Err(CommandError::InvalidTarget)
        );
        assert_eq!(
            parse("SET_HP", json!({"target_id": "goblin", "delta": "-3"})),
            Err(CommandError::InvalidDelta)
        );
        assert_eq!(
            parse("SET_HP", json!({"target_id": "goblin", "delta": -3})),
            Ok(Command::SetHp {
                target_id: "goblin".into(),
                delta: -3
            })
        );
    }

    #[test]
    fn test_unknown_command_names_itself() {
        let err = parse("TELEPORT", json!({})).unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("TELEPORT".into()));
        assert_eq!(err.to_string(), "Unknown command: TELEPORT");
        assert_eq!(err.command(), None);
    }

    #[test]
    fn test_kind_matches_wire_name() {
        let cmd = parse("SET_HP", json!({"target_id": "g", "delta": 1})).unwrap();
        assert_eq!(cmd.kind(), EventType::SetHp);
    }
}
