//! In-memory linkstore server.
//!
//! Speaks the same command grammar as the real message store, so the browser
//! demo and the client engine can be exercised end to end:
//!   cargo run -p linkstore-store -- --seed
//!   cargo run -p linkstore-browser -- --url ws://127.0.0.1:8080/websocket

mod server;
mod store;

use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linkstore-store", about = "In-memory linkstore server")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "LINKSTORE_ADDR", default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Start with a small linked graph instead of an empty store
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("linkstore_store=info".parse()?))
        .init();

    let args = Args::parse();
    let store = if args.seed {
        store::Store::seeded()
    } else {
        store::Store::new()
    };

    tracing::info!("Starting store with {} entries", store.max_index());
    server::run(args.addr, store).await
}
