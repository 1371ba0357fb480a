use crate::parser::FeedParser;
use crate::rss_utils;
use crate::traits::FeedSource;
use crate::types::{AggregatorError, FetchConfig, FetchedFeed, Result};
use crate::Fetcher;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// Feed source that downloads RSS/Atom documents over HTTP
pub struct RssFeedSource {
    fetcher: Fetcher,
}

impl RssFeedSource {
    pub fn new(fetch_config: FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(fetch_config)?,
        })
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    fn source_name(&self) -> String {
        format!("RSS over HTTP ({})", self.fetcher.config().user_agent)
    }

    async fn fetch(&self, url: &str) -> Result<FetchedFeed> {
        info!("Pulling RSS feed: {}", url);

        let fetch_result = self.fetcher.fetch_feed(url).await?;
        debug!(
            "Feed {} answered with status {:?} in {}ms",
            url, fetch_result.http_status, fetch_result.response_time_ms
        );

        if !fetch_result.success {
            let error_msg = fetch_result.error.unwrap_or_else(|| "Fetch failed".to_string());
            error!(
                "Failed to fetch RSS feed {} after {}ms: {}",
                url, fetch_result.response_time_ms, error_msg
            );
            return Err(AggregatorError::General(error_msg));
        }

        let content = match fetch_result.content {
            Some(content) => content,
            None => {
                warn!("No content returned for RSS feed {}", url);
                return Ok(FetchedFeed {
                    url: url.to_string(),
                    title: rss_utils::url::fallback_source_name(url),
                    entries: Vec::new(),
                });
            }
        };

        if !FeedParser::is_valid_feed_content(&String::from_utf8_lossy(&content)) {
            return Err(AggregatorError::Parse(format!(
                "Response from {} is not an RSS/Atom document",
                url
            )));
        }

        let parsed_feed = FeedParser::parse_feed(&content)?;
        let title = parsed_feed
            .title
            .unwrap_or_else(|| rss_utils::url::fallback_source_name(url));

        info!(
            "Successfully pulled {} entries from {} ({})",
            parsed_feed.entries.len(),
            title,
            url
        );

        Ok(FetchedFeed {
            url: url.to_string(),
            title,
            entries: parsed_feed.entries,
        })
    }
}
