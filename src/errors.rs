//! [`Error`][core::error::Error] implementations used across the crate

use bytes::Bytes;
use thiserror::Error;

#[cfg(feature = "reqwest")]
pub mod reqwest;
#[cfg(feature = "reqwest")]
pub use self::reqwest::LaunchError;

/// Type-erased error from whatever is producing the response body
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Everything that can end a stream other than a `message_end` event. Each of these is delivered at most once, as the final outcome on the channel.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The caller asked the stream to stop
    #[error("stream cancelled")]
    Cancelled,
}

impl StreamError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

/// Reading from the body failed, or it ended before a terminal event arrived
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("error reading line: {0}")]
    Read(#[source] BoxError),
    #[error("stream ended before a terminal event ({trailing} unterminated bytes discarded)")]
    UnexpectedEof { trailing: usize },
}

impl TransportError {
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. })
    }
}

/// A data frame that is not a valid event payload
#[derive(Debug, Error)]
#[error("error unmarshalling event at `{path}`: {source}")]
pub struct DecodeError {
    raw: Bytes,
    path: String,
    #[source]
    source: serde_json::Error,
}

impl DecodeError {
    pub(crate) fn new(raw: Bytes, path: String, source: serde_json::Error) -> Self {
        Self { raw, path, source }
    }

    /// The payload exactly as it followed `data:` on the wire
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Path to the field that failed, `.` for the root
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// The server sent an explicit `error` event
#[derive(Debug, Error)]
#[error("error streaming event: {raw}")]
pub struct ProtocolError {
    raw: String,
    pub status: Option<u16>,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ProtocolError {
    pub(crate) fn new(raw: String) -> Self {
        Self {
            raw,
            status: None,
            code: None,
            message: None,
        }
    }

    /// The payload exactly as it followed `data:` on the wire
    pub fn raw(&self) -> &str {
        &self.raw
    }
}
