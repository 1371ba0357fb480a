use crate::types::{AggregatorError, FetchConfig, FetchResult, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Download one feed document. Transport and HTTP failures are reported
    /// in the result rather than as an `Err`, so callers can log the status.
    pub async fn fetch_feed(&self, url: &str) -> Result<FetchResult> {
        let start_time = Instant::now();

        debug!("Fetching feed: {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request failed for {}: {}", url, e);
                return Ok(FetchResult {
                    success: false,
                    error: Some(e.to_string()),
                    response_time_ms: start_time.elapsed().as_millis() as u64,
                    http_status: None,
                    content: None,
                });
            }
        };

        let response_time = start_time.elapsed().as_millis() as u64;
        let status = response.status();

        if !status.is_success() {
            return Ok(FetchResult {
                success: false,
                error: Some(format!(
                    "HTTP {}: {}",
                    status,
                    status.canonical_reason().unwrap_or("Unknown")
                )),
                response_time_ms: response_time,
                http_status: Some(status.as_u16()),
                content: None,
            });
        }

        if let Some(content_length) = response.content_length() {
            self.check_size(content_length as usize)?;
        }

        let bytes = response.bytes().await?;
        self.check_size(bytes.len())?;

        info!("Successfully fetched feed: {} ({} bytes)", url, bytes.len());
        Ok(FetchResult {
            success: true,
            error: None,
            response_time_ms: response_time,
            http_status: Some(status.as_u16()),
            content: Some(bytes.to_vec()),
        })
    }

    fn check_size(&self, len: usize) -> Result<()> {
        let size_mb = len / (1024 * 1024);
        if size_mb >= self.config.max_feed_size_mb {
            return Err(AggregatorError::FeedTooLarge { size_mb });
        }
        Ok(())
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}
