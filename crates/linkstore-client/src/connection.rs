//! The single WebSocket owned by a session.

use crate::error::ClientError;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use linkstore_core::{ClientEnvelope, ConnectionState};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Read half of an open socket.
pub type FrameStream = SplitStream<WsStream>;

/// Write half of the socket plus its lifecycle state.
///
/// Holding the only write half is what keeps a session to one socket: a new
/// socket can only be attached by replacing the old one.
pub struct Connection {
    state: ConnectionState,
    writer: Option<SplitSink<WsStream, Message>>,
}

impl Connection {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Closed,
            writer: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Drop any previous socket and enter `Connecting`.
    pub fn begin_connect(&mut self) {
        self.writer = None;
        self.state = ConnectionState::Connecting;
    }

    /// Take ownership of a freshly handshaken socket and return its read half.
    pub fn attach(&mut self, ws: WsStream) -> FrameStream {
        let (writer, frames) = ws.split();
        self.writer = Some(writer);
        self.state = ConnectionState::Open;
        frames
    }

    pub fn mark_closed(&mut self) {
        self.writer = None;
        self.state = ConnectionState::Closed;
    }

    /// Send one envelope. Fails with [`ClientError::NotConnected`] unless open;
    /// nothing is queued for later.
    pub async fn send(&mut self, envelope: &ClientEnvelope) -> Result<(), ClientError> {
        if self.state != ConnectionState::Open {
            return Err(ClientError::NotConnected);
        }
        let writer = self.writer.as_mut().ok_or(ClientError::NotConnected)?;
        let text = envelope.to_json()?;
        if let Err(e) = writer.send(Message::Text(text.into())).await {
            self.mark_closed();
            return Err(e.into());
        }
        Ok(())
    }

    /// Close the socket politely, if there is one.
    pub async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.close().await {
                tracing::debug!(error = %e, "error closing websocket");
            }
        }
        self.state = ConnectionState::Closed;
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}
