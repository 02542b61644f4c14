pub(crate) const LF: u8 = b'\n';

// data-line = "data:" payload LF
pub(crate) const DATA_PREFIX: &[u8; 5] = b"data:";

pub(crate) const MESSAGE: &str = "message";
pub(crate) const AGENT_MESSAGE: &str = "agent_message";
pub(crate) const AGENT_THOUGHT: &str = "agent_thought";
pub(crate) const MESSAGE_FILE: &str = "message_file";
pub(crate) const MESSAGE_REPLACE: &str = "message_replace";
pub(crate) const MESSAGE_END: &str = "message_end";
pub(crate) const ERROR: &str = "error";
pub(crate) const PING: &str = "ping";

#[cfg(feature = "reqwest")]
pub(crate) const CHAT_MESSAGES_PATH: &str = "/v1/chat-messages";
#[cfg(feature = "reqwest")]
pub(crate) const EVENT_STREAM_MIME: &str = "text/event-stream";

/// Capacity of 1 keeps the hand-off close to a rendezvous: the driver reads at most one frame ahead of the consumer
pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 1;
