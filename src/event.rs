//! Typed representation of the JSON objects carried by chat-message `data:` frames

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{
    constants::{
        AGENT_MESSAGE, AGENT_THOUGHT, ERROR, MESSAGE, MESSAGE_END, MESSAGE_FILE, MESSAGE_REPLACE,
        PING,
    },
    errors::StreamError,
};

/// What ends up on the channel, a decoded event or the reason the stream stopped
pub type StreamOutcome = Result<StreamEvent, StreamError>;

/// Value of the `event` field. Servers add new kinds over time so anything unrecognised lands in [EventKind::Unknown] with its original text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Answer fragment from a chat app
    #[default]
    Message,
    /// Answer fragment from an agent app
    AgentMessage,
    AgentThought,
    MessageFile,
    /// The server rewrote the answer so far (e.g. moderation), `answer` holds the replacement
    MessageReplace,
    /// Terminal, carries usage metadata
    MessageEnd,
    Error,
    Ping,
    Unknown(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Message => MESSAGE,
            EventKind::AgentMessage => AGENT_MESSAGE,
            EventKind::AgentThought => AGENT_THOUGHT,
            EventKind::MessageFile => MESSAGE_FILE,
            EventKind::MessageReplace => MESSAGE_REPLACE,
            EventKind::MessageEnd => MESSAGE_END,
            EventKind::Error => ERROR,
            EventKind::Ping => PING,
            EventKind::Unknown(other) => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::MessageEnd)
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        match value {
            MESSAGE => EventKind::Message,
            AGENT_MESSAGE => EventKind::AgentMessage,
            AGENT_THOUGHT => EventKind::AgentThought,
            MESSAGE_FILE => EventKind::MessageFile,
            MESSAGE_REPLACE => EventKind::MessageReplace,
            MESSAGE_END => EventKind::MessageEnd,
            ERROR => EventKind::Error,
            PING => EventKind::Ping,
            other => EventKind::Unknown(other.to_owned()),
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match EventKind::from(value.as_str()) {
            // reuse the allocation we already have
            EventKind::Unknown(_) => EventKind::Unknown(value),
            known => known,
        }
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        match value {
            EventKind::Unknown(other) => other,
            known => known.as_str().to_owned(),
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.as_str().fmt(f)
    }
}

/// One decoded frame. Fields the server left out are empty rather than missing, a `ping` for example only carries `event`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub event: EventKind,
    #[serde(deserialize_with = "null_as_default")]
    pub task_id: String,
    #[serde(rename = "id", deserialize_with = "null_as_default")]
    pub message_id: String,
    /// Fragment to append to the answer so far, may be empty
    #[serde(deserialize_with = "null_as_default")]
    pub answer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_id: String,
    /// Unix timestamp in seconds
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: i64,
    /// Only present on `message_end`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        self.event.is_terminal()
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.metadata.as_ref().map(|metadata| &metadata.usage)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(deserialize_with = "null_as_default")]
    pub usage: Usage,
    /// Citations from knowledge retrieval, passed through untouched
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub retriever_resources: Vec<Map<String, Value>>,
}

/// Token accounting for the whole message. Prices are decimal strings and are kept verbatim to avoid float rounding
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    #[serde(deserialize_with = "null_as_default")]
    pub prompt_tokens: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub prompt_unit_price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub prompt_price_unit: String,
    #[serde(deserialize_with = "null_as_default")]
    pub prompt_price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub completion_tokens: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub completion_unit_price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub completion_price_unit: String,
    #[serde(deserialize_with = "null_as_default")]
    pub completion_price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub total_tokens: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
    /// Seconds
    #[serde(deserialize_with = "null_as_default")]
    pub latency: f64,
}

/// `null` reads as the field's default instead of failing the whole frame
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
