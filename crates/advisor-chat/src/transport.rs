//! Transport abstraction for opening chat streams

use std::time::Duration;

use advisor_wire::{ChatClient, ChatRequest, Error, Result, WireEventStream};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Calculate delay for a given attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Opens a response stream for a chat request
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` and return its decoded event stream.
    ///
    /// Cancelling `cancel` ends the stream with `Error::Aborted`.
    async fn open(&self, request: &ChatRequest, cancel: CancellationToken)
    -> Result<WireEventStream>;
}

/// HTTP transport - talks to the chat endpoint
pub struct HttpTransport {
    client: ChatClient,
    retry_config: RetryConfig,
}

impl HttpTransport {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            retry_config: RetryConfig::default(),
        }
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<WireEventStream> {
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Aborted);
            }

            // Only opening is retried; once bytes flow a failure ends the turn.
            match self.client.stream(request, cancel.clone()).await {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt < self.retry_config.max_retries && e.is_retryable() => {
                    let delay = self.retry_config.delay_for_attempt(attempt);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt + 1,
                        self.retry_config.max_retries + 1,
                        e,
                        delay
                    );
                    attempt += 1;
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(Error::Aborted),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
