//! The command processor: one envelope in, at most one event out.

use std::num::NonZeroUsize;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabletop_protocol::{CommandEnvelope, Event, EventPayload};

use crate::{Admission, Command, CommandError, GameState, Ledger};

/// What happened to one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Accepted and applied. Broadcast this to everyone.
    Applied(Event),
    /// Seen before. Send nothing to anyone.
    Duplicate,
    /// Rejected. Send the error to the originator only.
    Rejected(CommandError),
}

/// Owns the game state and the ledger, and applies commands to them.
///
/// The order for every envelope is fixed:
///
/// ```text
/// duplicate? ──yes──→ Duplicate
///     │no
/// parse + validate ──err──→ Rejected      (no seq, no dedup entry)
///     │ok
/// admit → seq reserved and recorded
///     │
/// mutate state → Applied(Event)
/// ```
///
/// `R` is the dice source; tests pass a seeded RNG.
pub struct CommandProcessor<R = StdRng> {
    state: GameState,
    ledger: Ledger,
    rng: R,
}

impl CommandProcessor<StdRng> {
    /// A processor with an unbounded ledger and OS-seeded dice.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl Default for CommandProcessor<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> CommandProcessor<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            state: GameState::new(),
            ledger: Ledger::new(),
            rng,
        }
    }

    /// Bounds how many dedup keys are remembered. `None` keeps all.
    pub fn with_retention(mut self, retention: Option<NonZeroUsize>) -> Self {
        self.ledger = Ledger::with_retention(retention);
        self
    }

    /// Processes one validated envelope.
    pub fn process(&mut self, envelope: &CommandEnvelope) -> Outcome {
        let CommandEnvelope {
            client_id,
            event_id,
            command,
            payload,
        } = envelope;

        if self.ledger.is_processed(client_id, event_id) {
            tracing::debug!(%client_id, event_id, "duplicate command ignored");
            return Outcome::Duplicate;
        }

        let command = match Command::parse(command, payload) {
            Ok(command) => command,
            Err(err) => {
                tracing::debug!(
                    %client_id,
                    event_id,
                    command = ?err.command(),
                    reason = %err,
                    "command rejected"
                );
                return Outcome::Rejected(err);
            }
        };

        let seq = match self.ledger.admit(client_id, event_id) {
            Admission::Accepted(seq) => seq,
            Admission::AlreadyProcessed => return Outcome::Duplicate,
        };

        let payload = match command {
            Command::Join { name } => {
                let player = self.state.join(client_id, name);
                EventPayload::Join {
                    client_id: client_id.clone(),
                    name: player.name.clone(),
                }
            }
            Command::Chat { text } => EventPayload::Chat {
                client_id: client_id.clone(),
                text,
            },
            Command::RollDice { sides } => EventPayload::RollDice {
                client_id: client_id.clone(),
                sides,
                result: self.rng.random_range(1..=sides),
            },
            Command::MoveToken { token_id, x, y } => {
                self.state.move_token(token_id.clone(), x, y);
                EventPayload::MoveToken { token_id, x, y }
            }
            Command::SetHp { target_id, delta } => {
                let new_hp = self.state.adjust_hp(&target_id, delta);
                EventPayload::SetHp {
                    target_id,
                    delta,
                    new_hp,
                }
            }
        };

        let event = Event::new(seq, event_id.clone(), payload);
        tracing::debug!(
            seq,
            %client_id,
            event_type = %event.event_type(),
            "command applied"
        );
        Outcome::Applied(event)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}
