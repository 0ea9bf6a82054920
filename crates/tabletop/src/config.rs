//! Server configuration.

use std::num::NonZeroUsize;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8765";

/// Default capacity of the table actor's command queue.
pub const DEFAULT_COMMAND_QUEUE_SIZE: usize = 1024;

/// Settings for a [`TabletopServer`](crate::TabletopServer).
///
/// Start from `ServerConfig::default()` and override what you need, or
/// use the builder methods on
/// [`TabletopServerBuilder`](crate::TabletopServerBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// How many submitted commands may wait for the table actor before
    /// connection handlers start waiting too.
    pub command_queue_size: usize,

    /// Most dedup keys to remember. `None` remembers every key for the
    /// lifetime of the process.
    pub dedup_retention: Option<NonZeroUsize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            command_queue_size: DEFAULT_COMMAND_QUEUE_SIZE,
            dedup_retention: None,
        }
    }
}
