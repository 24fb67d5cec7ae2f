//! Connection and navigation engine for the linkstore message-store client.
//!
//! The engine keeps one WebSocket to the store, turns user [`Intent`]s into
//! wire commands, and reconciles the store's uncorrelated replies into a
//! [`NavigationState`]: the current entry, the store size, and the link graph
//! two hops around the current entry. Everything visible goes through a
//! [`RenderSink`] supplied by the front end.
//!
//! ```no_run
//! # async fn demo(sink: impl linkstore_client::RenderSink + Send + 'static) {
//! use linkstore_client::{ClientConfig, Intent, Session};
//!
//! let config = ClientConfig::new("ws://127.0.0.1:8080/websocket");
//! let (session, intents) = Session::new(config, sink);
//! tokio::spawn(session.run());
//! intents.send(Intent::ChangeIndex(1)).await.ok();
//! # }
//! ```

mod config;
mod connection;
mod error;
mod navigator;
mod render;
mod router;
mod session;
mod state;

pub use config::{ClientConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_RECONNECT_DELAY};
pub use connection::{Connection, FrameStream};
pub use error::ClientError;
pub use navigator::{Intent, Navigator};
pub use render::{LinkLabel, RenderSink};
pub use session::Session;
pub use state::{LinkSet, NavigationState};
