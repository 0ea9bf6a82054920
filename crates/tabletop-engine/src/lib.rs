//! Command processing engine for the tabletop server.
//!
//! Everything with a real invariant lives here:
//!
//! - [`Ledger`]: deduplication on `(client_id, event_id)` and gap-free
//!   sequence assignment, as one unit
//! - [`GameState`]: players and tokens
//! - [`Command`]: a closed enum over the five command kinds, parsed and
//!   validated from an envelope payload
//! - [`CommandProcessor`]: ties the three together: one envelope in, at
//!   most one [`Event`](tabletop_protocol::Event) out
//!
//! Nothing in this crate is async or shared. The server gives a single
//! task exclusive ownership of a `CommandProcessor`, which is what makes
//! dedup-check, seq reservation, and state mutation atomic.

mod command;
mod error;
mod ledger;
mod processor;
mod state;

pub use command::{Command, MAX_SIDES, MIN_SIDES};
pub use error::CommandError;
pub use ledger::{Admission, Ledger};
pub use processor::{CommandProcessor, Outcome};
pub use state::{DEFAULT_HP, GameState, Player, Token};
