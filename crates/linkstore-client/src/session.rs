//! Session driver: connect, dispatch, reconnect.
//!
//! A session is one task that owns the navigator, the render sink and the
//! socket. Inbound frames and user intents are handled one at a time on that
//! task, so the navigation state needs no locking.
//!
//! When the socket closes, for whatever reason, exactly one reconnect attempt
//! is made after the configured delay. The delay never grows and attempts
//! never stop; the session only ends when every intent sender is dropped.

use crate::config::ClientConfig;
use crate::connection::{Connection, FrameStream};
use crate::error::ClientError;
use crate::navigator::{Intent, Navigator};
use crate::render::RenderSink;
use futures_util::StreamExt;
use linkstore_core::ClientEnvelope;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Why the current connection phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Reconnect,
    Shutdown,
}

pub struct Session<S> {
    config: ClientConfig,
    navigator: Navigator,
    sink: S,
    connection: Connection,
    intents: mpsc::Receiver<Intent>,
}

impl<S: RenderSink> Session<S> {
    /// Create a session and the sender its front end uses to submit intents.
    pub fn new(config: ClientConfig, sink: S) -> (Self, mpsc::Sender<Intent>) {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let session = Self {
            navigator: Navigator::from_config(&config),
            config,
            sink,
            connection: Connection::new(),
            intents: rx,
        };
        (session, tx)
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Run until every intent sender is dropped, then hand the sink back.
    pub async fn run(mut self) -> S {
        loop {
            let frames = match self.connect().await {
                Ok(frames) => frames,
                Err(Flow::Shutdown) => return self.shutdown().await,
                Err(Flow::Reconnect) => {
                    if self.wait_before_reconnect().await == Flow::Shutdown {
                        return self.shutdown().await;
                    }
                    continue;
                }
            };

            let out = self.navigator.on_open(&mut self.sink);
            self.send_all(out).await;

            if self.pump(frames).await == Flow::Shutdown {
                return self.shutdown().await;
            }

            self.connection.mark_closed();
            tracing::info!("websocket disconnected");
            self.sink.show_status("Disconnected");

            if self.wait_before_reconnect().await == Flow::Shutdown {
                return self.shutdown().await;
            }
        }
    }

    /// One connection attempt. Intents arriving during the handshake are
    /// handled, and their sends dropped.
    async fn connect(&mut self) -> Result<FrameStream, Flow> {
        tracing::info!(url = %self.config.url, "connecting");
        self.connection.begin_connect();
        self.sink.show_status("Connecting");

        let handshake = tokio_tungstenite::connect_async(self.config.url.clone());
        tokio::pin!(handshake);

        let result = loop {
            tokio::select! {
                result = &mut handshake => break result,
                intent = self.intents.recv() => match intent {
                    Some(intent) => self.apply_intent(intent).await,
                    None => return Err(Flow::Shutdown),
                },
            }
        };

        match result {
            Ok((ws, _response)) => {
                tracing::info!(url = %self.config.url, "websocket connected");
                Ok(self.connection.attach(ws))
            }
            Err(e) => {
                tracing::warn!(url = %self.config.url, error = %e, "connect failed");
                self.connection.mark_closed();
                self.sink.show_status(&format!("Connection failed: {e}"));
                Err(Flow::Reconnect)
            }
        }
    }

    /// Dispatch frames and intents until the socket goes away.
    async fn pump(&mut self, mut frames: FrameStream) -> Flow {
        loop {
            tokio::select! {
                frame = frames.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        let out = self.navigator.handle_frame(&text, &mut self.sink);
                        self.send_all(out).await;
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        tracing::warn!(len = bytes.len(), "ignoring binary frame");
                        self.sink.show_status("Failed to parse server response: binary frame");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::debug!(?frame, "close frame received");
                        return Flow::Reconnect;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "websocket error");
                        return Flow::Reconnect;
                    }
                    None => return Flow::Reconnect,
                },
                intent = self.intents.recv() => match intent {
                    Some(intent) => self.apply_intent(intent).await,
                    None => return Flow::Shutdown,
                },
            }
        }
    }

    /// Sleep out the reconnect delay, still serving intents.
    async fn wait_before_reconnect(&mut self) -> Flow {
        let delay = self.config.reconnect_delay;
        tracing::info!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");
        let deadline = tokio::time::sleep(delay);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => return Flow::Reconnect,
                intent = self.intents.recv() => match intent {
                    Some(intent) => self.apply_intent(intent).await,
                    None => return Flow::Shutdown,
                },
            }
        }
    }

    async fn apply_intent(&mut self, intent: Intent) {
        tracing::debug!(?intent, "intent");
        let out = self.navigator.handle_intent(intent, &mut self.sink);
        self.send_all(out).await;
    }

    /// Fire-and-forget sends. Anything that cannot go out right now is
    /// dropped with a status message.
    async fn send_all(&mut self, envelopes: Vec<ClientEnvelope>) {
        for envelope in envelopes {
            match self.connection.send(&envelope).await {
                Ok(()) => tracing::trace!(?envelope, "sent"),
                Err(ClientError::NotConnected) => {
                    tracing::warn!(?envelope, "websocket is not connected, dropping");
                    self.sink.show_status("Error: WebSocket is not connected");
                }
                Err(e) => {
                    tracing::warn!(?envelope, error = %e, "send failed, dropping");
                    self.sink.show_status(&format!("Error: {e}"));
                }
            }
        }
    }

    async fn shutdown(mut self) -> S {
        tracing::info!("intent channel closed, shutting down");
        self.connection.close().await;
        self.sink
    }
}
