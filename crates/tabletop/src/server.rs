//! `TabletopServer` builder and accept loop.
//!
//! This ties the layers together: transport → protocol → table actor
//! (engine + registry).

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tabletop_engine::CommandProcessor;
use tabletop_protocol::{Codec, JsonCodec};
use tabletop_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::table::{TableHandle, spawn_table};
use crate::{ServerConfig, TabletopError};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) table: TableHandle,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a tabletop server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> Result<(), tabletop::TabletopError> {
/// let server = tabletop::TabletopServerBuilder::new()
///     .bind("0.0.0.0:8765")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TabletopServerBuilder {
    config: ServerConfig,
}

impl TabletopServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the table actor's command queue capacity.
    pub fn command_queue_size(mut self, size: usize) -> Self {
        self.config.command_queue_size = size;
        self
    }

    /// Bounds how many dedup keys are remembered.
    pub fn dedup_retention(mut self, retention: Option<NonZeroUsize>) -> Self {
        self.config.dedup_retention = retention;
        self
    }

    /// Binds the listener and starts the table actor.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<TabletopServer<JsonCodec>, TabletopError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let processor = CommandProcessor::new().with_retention(self.config.dedup_retention);
        let table = spawn_table(processor, JsonCodec, self.config.command_queue_size);

        let state = Arc::new(ServerState {
            table,
            codec: JsonCodec,
        });

        Ok(TabletopServer { transport, state })
    }
}

/// A bound tabletop server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TabletopServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> TabletopServer<C> {
    /// Creates a new builder.
    pub fn builder() -> TabletopServerBuilder {
        TabletopServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the table actor, for inspecting counters.
    pub fn table(&self) -> TableHandle {
        self.state.table.clone()
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task for each accepted connection. A failed
    /// accept is logged and the loop continues. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), TabletopError> {
        tracing::info!("tabletop server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
