//! Client errors.

/// Errors surfaced by the connection layer.
///
/// None of these are fatal to a session: a failed send is dropped and a
/// failed connection is retried.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("WebSocket is not connected")]
    NotConnected,
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}
