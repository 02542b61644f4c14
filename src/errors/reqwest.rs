use ::reqwest::StatusCode;
use thiserror::Error;

/// The streaming request never got off the ground, nothing was spawned
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to serialize chat request: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to build chat request: {0}")]
    Build(#[source] ::reqwest::Error),
    #[error("failed to send chat request: {0}")]
    Send(#[source] ::reqwest::Error),
    #[error("chat request rejected with {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl LaunchError {
    /// Status code of the response, if there was one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Send(e) | Self::Build(e) => e.status(),
            Self::Serialize(_) => None,
        }
    }
}
