//! Push notifications via a plain-text webhook (ntfy style).

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;
use url::Url;

/// Upper bound on the response body kept for diagnostics.
pub const MAX_ERROR_BODY_BYTES: usize = 512;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Failed to build notification request: {0}")]
    Request(String),

    #[error("Notification request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Notification timed out after {0:?}")]
    Timeout(Duration),

    #[error("Notification endpoint returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Posts alert text to a single configured endpoint.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    endpoint: Url,
}

impl Notifier {
    pub fn new(endpoint: Url) -> Result<Self, SendError> {
        let client = Client::builder()
            .build()
            .map_err(|e| SendError::Request(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    /// POST `message` as the request body.
    ///
    /// Any status of 300 or above is a [`SendError::Status`] carrying up to
    /// [`MAX_ERROR_BODY_BYTES`] of the response body.
    #[instrument(skip(self, message), fields(endpoint = %self.endpoint), level = "debug")]
    pub async fn send(&self, message: &str, time_budget: Duration) -> Result<(), SendError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .body(message.to_owned())
            .timeout(time_budget)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SendError::Timeout(time_budget)
                } else if e.is_builder() {
                    SendError::Request(e.to_string())
                } else {
                    SendError::Transport(e)
                }
            })?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = body_excerpt(response).await;
            return Err(SendError::Status { status, body });
        }

        Ok(())
    }
}

/// Read at most [`MAX_ERROR_BODY_BYTES`] of the body. Read failures end the
/// excerpt early rather than masking the status error. The decoded text never
/// exceeds the byte cap.
async fn body_excerpt(mut response: Response) -> String {
    let mut buf: Vec<u8> = Vec::with_capacity(MAX_ERROR_BODY_BYTES);

    while buf.len() < MAX_ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = (MAX_ERROR_BODY_BYTES - buf.len()).min(chunk.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Stopped reading error body: {}", e);
                break;
            }
        }
    }

    // Drop a multi-byte character split by the cap.
    if let Err(e) = std::str::from_utf8(&buf) {
        if e.error_len().is_none() {
            buf.truncate(e.valid_up_to());
        }
    }

    let mut text = String::from_utf8_lossy(&buf).into_owned();
    if text.len() > MAX_ERROR_BODY_BYTES {
        let mut end = MAX_ERROR_BODY_BYTES;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}
