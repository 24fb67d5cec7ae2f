//! Wire envelopes.
//!
//! Every frame in either direction is a single JSON object carrying an
//! `action` discriminator. Outbound frames are a closed set; inbound frames
//! are classified by [`ServerEnvelope::decode`], which treats an unknown
//! action as data rather than an error.

use crate::command::{Command, Format};
use crate::diagnostics::{FreeSpaceRow, IndexRow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientEnvelope {
    /// A navigation or editing command (see [`Command`]).
    Message { content: String },
    /// File-browser listing request. Carried but not interpreted by the engine.
    ListFiles { path: String },
}

impl ClientEnvelope {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<Command> for ClientEnvelope {
    fn from(command: Command) -> Self {
        ClientEnvelope::Message {
            content: command.to_string(),
        }
    }
}

/// A stored entry, as listed in a link pane or fetched directly.
///
/// Link entries arrive either as an object with an `index` and any of
/// `content`, `message` or `text`, or as a bare index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireLink")]
pub struct MessageRef {
    pub index: u32,
    pub content: String,
    pub format: Format,
}

impl MessageRef {
    pub fn new(index: u32, content: impl Into<String>) -> Self {
        Self {
            index,
            content: content.into(),
            format: Format::Text,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireLink {
    Entry {
        index: u32,
        #[serde(default, alias = "message", alias = "text")]
        content: String,
        #[serde(default)]
        format: Format,
    },
    Index(u32),
}

impl From<WireLink> for MessageRef {
    fn from(link: WireLink) -> Self {
        match link {
            WireLink::Entry {
                index,
                content,
                format,
            } => Self {
                index,
                content,
                format,
            },
            WireLink::Index(index) => Self {
                index,
                content: String::new(),
                format: Format::Text,
            },
        }
    }
}

/// The `links` object of a `message_response`. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkLists {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<Vec<MessageRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backward: Option<Vec<MessageRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward2: Option<Vec<MessageRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backward2: Option<Vec<MessageRef>>,
}

/// Payload of the overloaded `message_response` action.
///
/// Reads, writes and link queries all share this action; which one a payload
/// answers is only recoverable from the fields that are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Unrecognized format names decode as `None`.
    #[serde(
        default,
        deserialize_with = "lenient_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub format: Option<Format>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<LinkLists>,
    /// Parent slot of a second-hop list.
    #[serde(
        default,
        rename = "parentNumber",
        alias = "parent_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_index: Option<u32>,
}

fn lenient_format<'de, D>(deserializer: D) -> Result<Option<Format>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|name| name.parse().ok()))
}

/// Actions the engine forwards to the render sink without interpreting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassThroughAction {
    FileList,
    FileContent,
    SaveResult,
    BuildResult,
    RunOutput,
}

impl PassThroughAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassThroughAction::FileList => "file_list",
            PassThroughAction::FileContent => "file_content",
            PassThroughAction::SaveResult => "save_result",
            PassThroughAction::BuildResult => "build_result",
            PassThroughAction::RunOutput => "run_output",
        }
    }

    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "file_list" => Some(PassThroughAction::FileList),
            "file_content" => Some(PassThroughAction::FileContent),
            "save_result" => Some(PassThroughAction::SaveResult),
            "build_result" => Some(PassThroughAction::BuildResult),
            "run_output" => Some(PassThroughAction::RunOutput),
            _ => None,
        }
    }
}

/// Frames sent from server to client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEnvelope {
    MessageResponse(MessageResponse),
    /// `{"action": "max_index", "value": n}`
    MaxIndex(u32),
    /// `{"action": "index_table_info", "data": [...]}`
    IndexTableInfo(Vec<IndexRow>),
    /// `{"action": "free_space_table_info", "data": [...]}`
    FreeSpaceTableInfo(Vec<FreeSpaceRow>),
    /// A recognized action outside the engine's concern, with its full payload.
    PassThrough {
        action: PassThroughAction,
        payload: Value,
    },
    /// An action nobody recognizes.
    Unknown(String),
}

#[derive(Deserialize)]
struct MaxIndexPayload {
    value: u32,
}

#[derive(Deserialize)]
struct TablePayload<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

fn payload<T: for<'de> Deserialize<'de>>(action: &str, value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|source| DecodeError::Payload {
        action: action.to_string(),
        source,
    })
}

impl ServerEnvelope {
    /// Classify a raw text frame.
    pub fn decode(frame: &str) -> Result<Self, DecodeError> {
        if frame.trim().is_empty() {
            return Err(DecodeError::Empty);
        }
        let value: Value = serde_json::from_str(frame)?;
        Self::from_value(value)
    }

    /// Classify an already parsed frame.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingAction)?
            .to_string();

        let envelope = match action.as_str() {
            "message_response" => ServerEnvelope::MessageResponse(payload(&action, value)?),
            "max_index" => {
                let p: MaxIndexPayload = payload(&action, value)?;
                ServerEnvelope::MaxIndex(p.value)
            }
            "index_table_info" => {
                let p: TablePayload<IndexRow> = payload(&action, value)?;
                ServerEnvelope::IndexTableInfo(p.data)
            }
            "free_space_table_info" => {
                let p: TablePayload<FreeSpaceRow> = payload(&action, value)?;
                ServerEnvelope::FreeSpaceTableInfo(p.data)
            }
            other => match PassThroughAction::from_action(other) {
                Some(action) => ServerEnvelope::PassThrough {
                    action,
                    payload: value,
                },
                None => ServerEnvelope::Unknown(other.to_string()),
            },
        };
        Ok(envelope)
    }

    /// The `action` discriminator of this envelope.
    pub fn action(&self) -> &str {
        match self {
            ServerEnvelope::MessageResponse(_) => "message_response",
            ServerEnvelope::MaxIndex(_) => "max_index",
            ServerEnvelope::IndexTableInfo(_) => "index_table_info",
            ServerEnvelope::FreeSpaceTableInfo(_) => "free_space_table_info",
            ServerEnvelope::PassThrough { action, .. } => action.as_str(),
            ServerEnvelope::Unknown(action) => action,
        }
    }

    /// Serialize to the wire representation.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut value = match self {
            ServerEnvelope::MessageResponse(resp) => serde_json::to_value(resp)?,
            ServerEnvelope::MaxIndex(n) => serde_json::json!({ "value": n }),
            ServerEnvelope::IndexTableInfo(rows) => serde_json::json!({ "data": rows }),
            ServerEnvelope::FreeSpaceTableInfo(rows) => serde_json::json!({ "data": rows }),
            ServerEnvelope::PassThrough { payload, .. } => payload.clone(),
            ServerEnvelope::Unknown(_) => serde_json::json!({}),
        };
        if let Value::Object(map) = &mut value {
            map.insert("action".into(), Value::String(self.action().to_string()));
        }
        Ok(value)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        Ok(self.to_value()?.to_string())
    }
}

/// Error classifying an inbound frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("empty frame")]
    Empty,
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame has no `action` field")]
    MissingAction,
    #[error("malformed `{action}` payload: {source}")]
    Payload {
        action: String,
        #[source]
        source: serde_json::Error,
    },
}
