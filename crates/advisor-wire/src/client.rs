//! HTTP client for the streaming chat endpoint

use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    stream::{WireEventStream, read_events},
    types::{ChatRequest, RequestShape},
};

/// Default local backend address
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/chat";

/// Time allowed for establishing the connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the chat endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    shape: RequestShape,
}

impl ChatClient {
    /// Create a client for an endpoint URL
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        reqwest::Url::parse(&endpoint)
            .map_err(|e| Error::InvalidConfig(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        // No overall timeout: answers stream for as long as the backend thinks
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            shape: RequestShape::default(),
        })
    }

    /// Set the request body layout
    pub fn with_shape(mut self, shape: RequestShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn shape(&self) -> RequestShape {
        self.shape
    }

    /// POST a chat request and stream the decoded response.
    ///
    /// Cancelling the token before the response headers arrive returns
    /// `Error::Aborted`; afterwards the returned stream ends with it.
    pub async fn stream(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<WireEventStream> {
        let body = request.body(self.shape);
        tracing::debug!(endpoint = %self.endpoint, "opening chat stream");

        let send = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Aborted),
            response = send => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let text = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Aborted),
                text = response.text() => text.unwrap_or_default(),
            };
            let body = if text.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                text
            };
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::from));

        Ok(read_events(bytes, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_endpoint() {
        let err = ChatClient::new("not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_default_shape_is_queries() {
        let client = ChatClient::new(DEFAULT_ENDPOINT).unwrap();
        assert_eq!(client.shape(), RequestShape::Queries);
        let client = client.with_shape(RequestShape::Message);
        assert_eq!(client.shape(), RequestShape::Message);
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
    }
}
