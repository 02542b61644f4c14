//! Configuration for the stream driver and the HTTP launcher

use crate::constants::DEFAULT_CHANNEL_CAPACITY;

/// Settings for a single spawned stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// Capacity of the outcome channel. Zero is treated as one.
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl StreamConfig {
    /// Set the capacity of the outcome channel
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// tokio panics on a zero-capacity channel
    pub(crate) fn effective_capacity(&self) -> usize {
        self.channel_capacity.max(1)
    }
}

/// Where to send chat requests and how to authenticate them
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    /// API root, e.g. `https://api.example.com`. A trailing slash is fine.
    pub base_url: String,
    /// Sent as a bearer token
    pub api_key: String,
    pub stream: StreamConfig,
}

#[cfg(feature = "reqwest")]
impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            stream: StreamConfig::default(),
        }
    }

    #[must_use]
    pub fn stream(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    /// Shorthand for setting [StreamConfig::channel_capacity]
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.stream.channel_capacity = capacity;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
