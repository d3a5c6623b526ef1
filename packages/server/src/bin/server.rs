//! KLV chat server.
//!
//! Accepts TCP clients speaking the KLV framing protocol, tracks a display name
//! per connection and fans chat messages out to every connected client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin klvchat-server
//! cargo run --bin klvchat-server -- --host 127.0.0.1 --port 9001 --history-capacity 50
//! ```

use clap::Parser;

use klvchat_server::{
    ServerConfig,
    config::{DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_FRAME_LEN, DEFAULT_PORT},
    run_server,
};
use klvchat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "klvchat-server")]
#[command(about = "Chat room server speaking the KLV framing protocol", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of chat messages kept for READ
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY, value_parser = parse_capacity)]
    history_capacity: usize,

    /// Largest accepted frame value in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_LEN)]
    max_frame_len: usize,
}

fn parse_capacity(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("history capacity must be at least 1".to_string()),
        Ok(capacity) => Ok(capacity),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        history_capacity: args.history_capacity,
        max_frame_len: args.max_frame_len,
    };

    if let Err(e) = run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
