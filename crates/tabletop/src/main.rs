use std::num::NonZeroUsize;

use clap::Parser;
use tabletop::{DEFAULT_COMMAND_QUEUE_SIZE, ServerConfig, TabletopServerBuilder};
use tracing_subscriber::EnvFilter;

/// Real-time shared tabletop server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on
    #[arg(short, long, default_value_t = 8765)]
    port: u16,
    /// Commands that may queue for the table before senders wait
    #[arg(long, default_value_t = DEFAULT_COMMAND_QUEUE_SIZE)]
    queue_size: usize,
    /// Remember at most this many (client_id, event_id) keys; unbounded if omitted
    #[arg(long)]
    dedup_retention: Option<NonZeroUsize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        command_queue_size: args.queue_size,
        dedup_retention: args.dedup_retention,
    };
    tracing::info!(addr = %config.bind_addr, "starting tabletop server");

    let server = TabletopServerBuilder::new().config(config).build().await?;
    server.run().await?;
    Ok(())
}
