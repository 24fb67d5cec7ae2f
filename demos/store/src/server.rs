//! WebSocket front of the in-memory store.

use crate::store::Store;
use futures_util::{SinkExt, StreamExt};
use linkstore_core::{
    ClientEnvelope, Command, Direction, Format, LinkLists, MessageRef, MessageResponse,
    PassThroughAction, ServerEnvelope,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;

type SharedStore = Arc<RwLock<Store>>;

pub async fn run(addr: SocketAddr, store: Store) -> anyhow::Result<()> {
    let store = Arc::new(RwLock::new(store));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on ws://{}", addr);

    loop {
        let (stream, client_addr) = listener.accept().await?;
        let store = store.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, client_addr, store).await {
                tracing::warn!("Connection error from {}: {}", client_addr, e);
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    store: SharedStore,
) -> anyhow::Result<()> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut stream) = ws.split();

    tracing::debug!("New connection from {}", addr);

    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!("WebSocket error: {}", e);
                break;
            }
        };

        let Message::Text(text) = msg else {
            continue;
        };
        let envelope: ClientEnvelope = match serde_json::from_str(&text) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!("Invalid message: {}", e);
                continue;
            }
        };

        let reply = match envelope {
            ClientEnvelope::Message { content } => {
                tracing::debug!("{} -> {}", addr, content);
                let mut s = store.write().await;
                respond(&mut s, &content)
            }
            ClientEnvelope::ListFiles { path } => ServerEnvelope::PassThrough {
                action: PassThroughAction::FileList,
                payload: serde_json::json!({ "path": path, "items": [] }),
            },
        };
        sink.send(Message::Text(reply.to_json()?.into())).await?;
    }

    tracing::debug!("Connection closed: {}", addr);
    Ok(())
}

fn text(content: impl Into<String>) -> ServerEnvelope {
    ServerEnvelope::MessageResponse(MessageResponse {
        content: Some(content.into()),
        ..Default::default()
    })
}

fn links(direction: Direction, second_hop: bool, list: Vec<MessageRef>) -> LinkLists {
    let mut lists = LinkLists::default();
    match (direction, second_hop) {
        (Direction::Forward, false) => lists.forward = Some(list),
        (Direction::Backward, false) => lists.backward = Some(list),
        (Direction::Forward, true) => lists.forward2 = Some(list),
        (Direction::Backward, true) => lists.backward2 = Some(list),
    }
    lists
}

fn encode_content(text: &str, format: Format) -> String {
    match format {
        Format::Text => text.to_string(),
        Format::Binary | Format::Hex => text.bytes().map(|b| format!("{b:02x}")).collect(),
    }
}

/// Answer one command string the way the store's wire protocol does.
pub fn respond(store: &mut Store, content: &str) -> ServerEnvelope {
    let command: Command = match content.parse() {
        Ok(command) => command,
        Err(e) => {
            tracing::debug!("Unparsed command {:?}: {}", content, e);
            return text(format!("Server received: {content}"));
        }
    };

    match command {
        Command::GetMaxIndex => ServerEnvelope::MaxIndex(store.max_index()),

        Command::Get { index, format } => match store.get(index) {
            Some(entry) => ServerEnvelope::MessageResponse(MessageResponse {
                content: Some(encode_content(&entry.text, format)),
                format: Some(format),
                ..Default::default()
            }),
            None => text("Error: Message not found"),
        },

        Command::GetLinked {
            index, direction, ..
        }
        | Command::GetLinks { index, direction } => match store.links(index, direction) {
            Some(list) => ServerEnvelope::MessageResponse(MessageResponse {
                links: Some(links(direction, false, list)),
                ..Default::default()
            }),
            None => text("Error: Message not found"),
        },

        Command::GetSecondHop {
            index,
            direction,
            parent_slot,
            ..
        } => match store.links(index, direction) {
            Some(list) => ServerEnvelope::MessageResponse(MessageResponse {
                links: Some(links(direction, true, list)),
                parent_number: Some(parent_slot),
                ..Default::default()
            }),
            None => text("Error: Message not found"),
        },

        Command::Modify { index, text: new_text } => match store.modify(index, &new_text) {
            Ok(()) => text(format!("Message with index {index} modified successfully")),
            Err(e) => text(format!("Error: Failed to modify message with index {index}: {e}")),
        },

        Command::Link {
            direction,
            source,
            target,
        } => match store.link(direction, source, target) {
            Ok(()) => ServerEnvelope::MessageResponse(MessageResponse {
                content: Some(format!("Added {direction} link from {source} to {target}")),
                saved_index: Some(source),
                max_index: Some(store.max_index()),
                ..Default::default()
            }),
            Err(e) => text(format!("Error: {e}")),
        },

        Command::Unlink {
            direction,
            source,
            target,
        } => match store.unlink(direction, source, target) {
            Ok(()) => ServerEnvelope::MessageResponse(MessageResponse {
                content: Some(format!("Removed {direction} link from {source} to {target}")),
                saved_index: Some(source),
                max_index: Some(store.max_index()),
                ..Default::default()
            }),
            Err(e) => text(format!("Error: {e}")),
        },

        Command::Append {
            text: new_text,
            linked_to,
        } => {
            let saved = store.append(&new_text);
            let linked_index = store
                .link(Direction::Forward, linked_to, saved)
                .ok()
                .map(|()| linked_to);
            ServerEnvelope::MessageResponse(MessageResponse {
                content: Some("Message saved successfully".to_string()),
                saved_index: Some(saved),
                max_index: Some(store.max_index()),
                linked_index,
                ..Default::default()
            })
        }

        Command::GetIndexTableInfo => ServerEnvelope::IndexTableInfo(store.index_table()),
        Command::GetFreeSpaceTableInfo => {
            ServerEnvelope::FreeSpaceTableInfo(store.free_space_table())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(env: ServerEnvelope) -> MessageResponse {
        match env {
            ServerEnvelope::MessageResponse(resp) => resp,
            other => panic!("expected message_response, got {other:?}"),
        }
    }

    #[test]
    fn fetch_in_each_format() {
        let mut store = Store::new();
        store.append("AB");
        assert_eq!(
            message(respond(&mut store, "get:1:text")).content.as_deref(),
            Some("AB")
        );
        assert_eq!(
            message(respond(&mut store, "get:1:binary")).content.as_deref(),
            Some("4142")
        );
        assert_eq!(
            message(respond(&mut store, "get:2:text")).content.as_deref(),
            Some("Error: Message not found")
        );
    }

    #[test]
    fn second_hop_carries_parent_slot() {
        let mut store = Store::seeded();
        let resp = message(respond(&mut store, "get:2:text:forward2:1"));
        assert_eq!(resp.parent_number, Some(1));
        let hop = resp.links.unwrap().forward2.unwrap();
        assert_eq!(hop[0].index, 4);
    }

    #[test]
    fn append_reports_link() {
        let mut store = Store::seeded();
        let resp = message(respond(&mut store, "another|3"));
        assert_eq!(resp.content.as_deref(), Some("Message saved successfully"));
        assert_eq!(resp.saved_index, Some(5));
        assert_eq!(resp.max_index, Some(5));
        assert_eq!(resp.linked_index, Some(3));
        assert_eq!(store.get(3).unwrap().forward, vec![5]);
    }

    #[test]
    fn unknown_text_is_echoed() {
        let mut store = Store::new();
        let resp = message(respond(&mut store, "hello there"));
        assert_eq!(resp.content.as_deref(), Some("Server received: hello there"));
        assert_eq!(respond(&mut store, "get_max_index"), ServerEnvelope::MaxIndex(0));
    }
}
