//! Interactive console session.

use std::time::Duration;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use klvchat_shared::protocol::keys;

use crate::{
    connection::ChatClient,
    console::{AVAILABLE_COMMANDS, ConsoleCommand, parse_input},
    error::ClientError,
    formatter::MessageFormatter,
    ui::{PROMPT, redisplay_prompt},
};

/// How long to wait for the server's farewell after sending `QUIT`
const QUIT_GRACE: Duration = Duration::from_secs(1);

/// Run a console session against `host:port` until the user quits or the
/// server closes the connection.
///
/// Sends `JOIN` with `name` (or an empty value) right after connecting.
pub async fn run_client_session(
    host: &str,
    port: u16,
    name: Option<&str>,
) -> Result<(), ClientError> {
    let client = ChatClient::connect(host, port, |frame| {
        print!("{}", MessageFormatter::format_frame(&frame));
        redisplay_prompt();
    })
    .await?;
    let (mut sender, mut listener) = client.into_split();

    println!(
        "\nConnected to {}:{}. Commands: {}. Press Ctrl+C to exit.\n",
        host, port, AVAILABLE_COMMANDS
    );
    sender.send(keys::JOIN, name.unwrap_or_default()).await?;

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // rustyline blocks, so it gets its own thread
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut listener => {
                println!("\nDisconnected from server");
                break;
            }
            line = input_rx.recv() => {
                // Ctrl+C or Ctrl+D leaves the room the same way `quit` does
                let command = match line {
                    None => ConsoleCommand::Quit,
                    Some(line) => match parse_input(&line) {
                        Ok(Some(command)) => command,
                        Ok(None) => continue,
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    },
                };

                sender.send(command.key(), command.value()).await?;
                if command == ConsoleCommand::Quit {
                    println!("Disconnecting...");
                    // Let the server's farewell arrive before closing
                    let _ = tokio::time::timeout(QUIT_GRACE, &mut listener).await;
                    break;
                }
            }
        }
    }

    sender.close().await;
    listener.abort();
    Ok(())
}
