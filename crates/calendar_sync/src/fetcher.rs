use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::CalendarError;

/// Largest calendar document accepted, in bytes (default: 5 MiB)
pub const DEFAULT_MAX_FEED_BYTES: usize = 5 * 1024 * 1024;

/// Trait for downloading raw calendar documents
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Returns the body of the document at `url`
    async fn fetch(&self, url: &str) -> Result<String, CalendarError>;
}

/// [`FeedFetcher`] over HTTP(S)
pub struct HttpFeedFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFeedFetcher {
    /// Creates a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, CalendarError> {
        let client = Client::builder()
            .user_agent("BeenestCalendarSync/1.0")
            .timeout(timeout)
            .build()
            .map_err(|e| CalendarError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_body_bytes: DEFAULT_MAX_FEED_BYTES,
        })
    }

    /// Rejects documents larger than `max_body_bytes`
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CalendarError> {
        debug!("Fetching calendar {}", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CalendarError::Fetch(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::Fetch(format!("HTTP {} from {}", status, url)));
        }

        let too_large = || {
            CalendarError::Fetch(format!(
                "Calendar {} exceeds {} bytes",
                url, self.max_body_bytes
            ))
        };

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CalendarError::Fetch(format!("Failed to read body: {}", e)))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
