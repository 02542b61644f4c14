//! Client-side decoding of streaming chat-message responses.
//!
//! A chat endpoint asked for `response_mode: "streaming"` answers with a body of `data:` lines, each
//! carrying one JSON event. `chatstream` reads those lines, decodes them into [`StreamEvent`]s and
//! hands them to you over a channel, stopping at the first terminal outcome: a `message_end` event
//! carrying usage metadata, or an error.
//!
//! The pieces, from the bottom up:
//!
//! - [`frame`] - splits a byte stream into lines and keeps only `data:` payloads, see [`FrameStream`][frame::FrameStream].
//! - [`decoder`] - turns one payload into a [`StreamEvent`], a malformed payload or an explicit
//!   `error` event into a [`StreamError`].
//! - [`ChatEventStream`] - both of the above as a pull-based [`Stream`][futures_core::Stream] that
//!   ends after the terminal outcome.
//! - [`spawn_stream`] - runs a [`ChatEventStream`] on its own tokio task, feeding a [`ChatStream`]
//!   and honouring cancellation even when the network or the consumer stalls.
//! - [`ChatClient`] (requires `reqwest` feature) - sends the request and spawns the driver over the response.
//!
//! # Quick start with `reqwest`
//!
//! ```ignore
//! use chatstream::{ChatClient, ClientConfig, ChatRequest};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ChatClient::new(ClientConfig::new("https://api.example.com", "app-key"));
//! let mut stream = client.open_stream(ChatRequest::new("Hello!", "user-1")).await?;
//!
//! while let Some(outcome) = stream.recv().await {
//!     let event = outcome?;
//!     print!("{}", event.answer);
//!     if let Some(usage) = event.usage() {
//!         println!("\n{} tokens", usage.total_tokens);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Bring your own body
//!
//! Anything that is a `Stream<Item = Result<impl AsRef<[u8]>, E>>` works without the `reqwest` feature:
//!
//! ```rust
//! use bytes::Bytes;
//! use chatstream::{StreamConfig, spawn_stream};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let body = futures::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from(
//!     "data: {\"event\":\"message\",\"answer\":\"hi\"}\n\ndata: {\"event\":\"message_end\"}\n\n",
//! ))]);
//! let stream = spawn_stream(body, &StreamConfig::default(), CancellationToken::new());
//!
//! let (answer, end) = stream.collect_answer().await.unwrap();
//! assert_eq!(answer, "hi");
//! assert!(end.is_terminal());
//! # }
//! ```
//!
//! # Feature flags
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `reqwest` | on | Provides [`ChatClient`] and [`response_to_stream`]. |

pub(crate) mod constants;
pub mod config;
pub mod decoder;
pub mod driver;
pub mod errors;
pub mod event;
pub mod event_stream;
pub mod frame;
pub mod request;
#[cfg(feature = "reqwest")]
pub mod client;

#[cfg(feature = "reqwest")]
pub use client::ChatClient;
#[cfg(feature = "reqwest")]
pub use config::ClientConfig;
pub use config::StreamConfig;
pub use driver::{ChatStream, spawn_stream};
pub use errors::StreamError;
pub use event::{EventKind, StreamEvent, StreamOutcome};
pub use event_stream::ChatEventStream;
pub use request::ChatRequest;

#[cfg(feature = "reqwest")]
/// Spawn a driver over the body of a [`Response`][::reqwest::Response] via a similar mechanism to [::reqwest::Response::bytes_stream]
pub fn response_to_stream(
    response: ::reqwest::Response,
    config: &StreamConfig,
    cancel: tokio_util::sync::CancellationToken,
) -> ChatStream {
    spawn_stream(
        http_body_util::BodyDataStream::new(::reqwest::Body::from(response)),
        config,
        cancel,
    )
}
