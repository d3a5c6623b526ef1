//! Console chat client for the KLV chat server.
//!
//! Connects, sends `JOIN` with the given name, then reads commands from the
//! prompt: `name <new>`, `msg <text>`, `time`, `read`, `quit`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin klvchat-client -- --name alice
//! cargo run --bin klvchat-client -- -H 192.168.0.10 -p 9001
//! ```

use clap::Parser;

use klvchat_client::run_client_session;
use klvchat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "klvchat-client")]
#[command(about = "Console client for the KLV chat server", long_about = None)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value_t = 9001)]
    port: u16,

    /// Display name sent with JOIN (the server assigns user<N> if omitted)
    #[arg(short = 'n', long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run_client_session(&args.host, args.port, args.name.as_deref()).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
