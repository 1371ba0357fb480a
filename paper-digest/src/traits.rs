use crate::types::{FetchedFeed, Result};
use async_trait::async_trait;

/// Trait for pulling entries from a feed endpoint (RSS, Atom, test fakes).
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Human-readable name for this source implementation
    fn source_name(&self) -> String;

    /// Fetch one endpoint and return its display name and raw entries,
    /// in feed order.
    async fn fetch(&self, url: &str) -> Result<FetchedFeed>;
}
