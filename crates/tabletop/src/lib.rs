//! # Tabletop
//!
//! A real-time, session-shared tabletop server. Clients connect over a
//! WebSocket, send commands (join, chat, roll dice, move a token, adjust
//! hit points), and every connected client receives the same totally
//! ordered, deduplicated stream of resulting events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tabletop::prelude::*;
//!
//! # async fn run() -> Result<(), TabletopError> {
//! let server = TabletopServerBuilder::new()
//!     .bind("0.0.0.0:8765")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;
mod table;

pub use config::{DEFAULT_BIND_ADDR, DEFAULT_COMMAND_QUEUE_SIZE, ServerConfig};
pub use error::TabletopError;
pub use handler::INVALID_JSON;
pub use server::{TabletopServer, TabletopServerBuilder};
pub use table::{TableHandle, TableInfo, spawn_table};

/// Everything needed to run a server or talk to one.
pub mod prelude {
    pub use crate::{ServerConfig, TableInfo, TabletopError, TabletopServer, TabletopServerBuilder};
    pub use tabletop_engine::{CommandError, CommandProcessor, Outcome};
    pub use tabletop_protocol::{
        ClientCommand, ClientId, Event, EventPayload, EventType, ServerMessage,
    };
}
