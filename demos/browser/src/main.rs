//! Terminal browser for a linkstore server.
//!
//! Reads one command per line from stdin and prints everything the engine
//! renders to stdout. Logs go to stderr.
//!
//!   cargo run -p linkstore-browser -- --url ws://127.0.0.1:8080/websocket

mod commands;
mod terminal;

use clap::Parser;
use commands::Input;
use linkstore_client::{ClientConfig, Session};
use linkstore_core::Format;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linkstore-browser", about = "Browse a linkstore server")]
struct Args {
    /// WebSocket URL of the store
    #[arg(long, env = "LINKSTORE_URL", default_value = "ws://127.0.0.1:8080/websocket")]
    url: String,

    /// Seconds to wait before reconnecting
    #[arg(long, env = "LINKSTORE_RECONNECT_SECS", default_value_t = 3)]
    reconnect_secs: u64,

    /// Entry shown after connecting
    #[arg(long, default_value_t = 1)]
    start: u32,

    /// Display format: text, binary or hex
    #[arg(long, default_value = "text")]
    format: Format,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("linkstore_browser=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = ClientConfig::new(args.url)
        .with_reconnect_delay(Duration::from_secs(args.reconnect_secs))
        .with_start_index(args.start)
        .with_format(args.format);

    tracing::info!("Browsing {}", config.url);
    let (session, intents) = Session::new(config, terminal::TerminalSink::stdout());
    let client = tokio::spawn(session.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match commands::parse_line(&line) {
            Ok(Input::Intent(intent)) => {
                if intents.send(intent).await.is_err() {
                    break;
                }
            }
            Ok(Input::Help) => println!("{}", commands::HELP),
            Ok(Input::Quit) => break,
            Err(e) => eprintln!("{e:#}"),
        }
    }

    drop(intents);
    client.await?;
    Ok(())
}
