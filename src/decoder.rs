//! Turns one frame payload into a [StreamEvent] or the error that ends the stream

use bytes::Bytes;
use serde::Deserialize;

use crate::{
    errors::{DecodeError, ProtocolError, StreamError},
    event::{EventKind, StreamEvent},
};

/// Fields of an `error` event worth pulling out, the raw text is kept regardless
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    status: Option<u16>,
    code: Option<String>,
    message: Option<String>,
}

/// Just the tag, for frames whose other fields don't decode
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Tag {
    event: Option<EventKind>,
}

/// Decodes `payload` (everything after `data:`).
///
/// - an `error` event becomes a [ProtocolError], whether or not its other fields decode
/// - otherwise malformed JSON is a [DecodeError] holding the raw bytes
/// - everything else, `message_end` and empty answers included, comes back as an event
pub fn decode_frame(payload: Bytes) -> Result<StreamEvent, StreamError> {
    let event = match deserialize_event(&payload) {
        Ok(event) => event,
        Err(_) if is_error_tag(&payload) => return Err(protocol_error(&payload).into()),
        Err((path, source)) => return Err(DecodeError::new(payload, path, source).into()),
    };

    if event.event == EventKind::Error {
        return Err(protocol_error(&payload).into());
    }

    Ok(event)
}

fn deserialize_event(payload: &[u8]) -> Result<StreamEvent, (String, serde_json::Error)> {
    let mut deserializer = serde_json::Deserializer::from_slice(payload);
    let event: StreamEvent = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| (e.path().to_string(), e.into_inner()))?;
    // one object per line, anything after it is garbage
    deserializer
        .end()
        .map_err(|e| (String::from("."), e))?;
    Ok(event)
}

fn is_error_tag(payload: &[u8]) -> bool {
    serde_json::from_slice::<Tag>(payload)
        .is_ok_and(|tag| tag.event == Some(EventKind::Error))
}

fn protocol_error(payload: &[u8]) -> ProtocolError {
    let body: ErrorBody = serde_json::from_slice(payload).unwrap_or_default();
    let mut error = ProtocolError::new(String::from_utf8_lossy(payload).into_owned());
    error.status = body.status;
    error.code = body.code;
    error.message = body.message;
    error
}
