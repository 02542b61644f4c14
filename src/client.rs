//! Launching streaming chat requests over [`reqwest`]

use reqwest::{
    Client, Response,
    header::{ACCEPT, CONTENT_TYPE, HeaderValue},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    config::ClientConfig,
    constants::{CHAT_MESSAGES_PATH, EVENT_STREAM_MIME},
    driver::ChatStream,
    errors::LaunchError,
    request::{ChatRequest, ResponseMode},
};

/// Sends chat requests in streaming mode and hands the response to a driver task.
///
/// Each call makes exactly one attempt, retrying is up to the caller.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    config: ClientConfig,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(Client::new(), config)
    }

    /// Use an existing [`Client`], to share its connection pool or TLS setup
    pub fn with_http_client(http: Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends `request` with `response_mode` forced to streaming and returns the live response.
    ///
    /// A non-success status is a [LaunchError::Status] carrying whatever body the server sent.
    pub async fn send_streaming(&self, mut request: ChatRequest) -> Result<Response, LaunchError> {
        request.response_mode = ResponseMode::Streaming;
        let body = serde_json::to_vec(&request).map_err(LaunchError::Serialize)?;

        let http_request = self
            .http
            .post(self.config.endpoint(CHAT_MESSAGES_PATH))
            .bearer_auth(&self.config.api_key)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCEPT, HeaderValue::from_static(EVENT_STREAM_MIME))
            .body(body)
            .build()
            .map_err(LaunchError::Build)?;

        debug!(url = %http_request.url(), "sending streaming chat request");
        let response = self
            .http
            .execute(http_request)
            .await
            .map_err(LaunchError::Send)?;

        let status = response.status();
        if !status.is_success() {
            // the status is the real error, an unreadable body shouldn't hide it
            let body = response.text().await.unwrap_or_default();
            return Err(LaunchError::Status { status, body });
        }

        Ok(response)
    }

    /// [send_streaming](Self::send_streaming) then spawn a driver over the body
    pub async fn open_stream(&self, request: ChatRequest) -> Result<ChatStream, LaunchError> {
        self.open_stream_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Like [open_stream](Self::open_stream), but cancelling `cancel` also stops the stream
    pub async fn open_stream_with_cancel(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ChatStream, LaunchError> {
        let response = self.send_streaming(request).await?;
        Ok(crate::response_to_stream(
            response,
            &self.config.stream,
            cancel,
        ))
    }
}
