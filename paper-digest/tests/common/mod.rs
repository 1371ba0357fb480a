#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use paper_digest::{
    AggregatorError, AppConfig, FeedSource, FetchedFeed, PaperRecord, RawEntry, Result,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// A record as the normalizer would produce it (unsent).
pub fn paper(id: &str) -> PaperRecord {
    PaperRecord {
        id: id.to_string(),
        title: format!("Paper {}", id),
        link: format!("https://journal.example/{}", id),
        authors: vec!["A. Author".to_string()],
        summary: String::new(),
        source: "Test Journal".to_string(),
        date: day(2024, 3, 1),
        sent: false,
    }
}

pub fn surfaced(id: &str) -> PaperRecord {
    PaperRecord {
        sent: true,
        ..paper(id)
    }
}

pub fn entry(id: &str) -> RawEntry {
    RawEntry {
        id: Some(id.to_string()),
        title: Some(format!("Paper {}", id)),
        link: Some(format!("https://journal.example/{}", id)),
        authors: vec![Some("A. Author".to_string())],
        ..RawEntry::default()
    }
}

/// In-memory feed source: each URL maps to a fixed feed or to a failure.
/// Responses can be swapped between runs.
pub struct StaticFeedSource {
    feeds: Mutex<HashMap<String, std::result::Result<FetchedFeed, String>>>,
}

impl StaticFeedSource {
    pub fn new() -> Self {
        Self {
            feeds: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_feed(self, url: &str, title: &str, entries: Vec<RawEntry>) -> Self {
        self.set_feed(url, title, entries);
        self
    }

    pub fn with_failure(self, url: &str, message: &str) -> Self {
        self.feeds
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(message.to_string()));
        self
    }

    pub fn set_feed(&self, url: &str, title: &str, entries: Vec<RawEntry>) {
        self.feeds.lock().unwrap().insert(
            url.to_string(),
            Ok(FetchedFeed {
                url: url.to_string(),
                title: title.to_string(),
                entries,
            }),
        );
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    fn source_name(&self) -> String {
        "static test feeds".to_string()
    }

    async fn fetch(&self, url: &str) -> Result<FetchedFeed> {
        match self.feeds.lock().unwrap().get(url) {
            Some(Ok(feed)) => Ok(feed.clone()),
            Some(Err(message)) => Err(AggregatorError::General(message.clone())),
            None => Err(AggregatorError::General(format!("no such feed: {}", url))),
        }
    }
}

/// Configuration rooted in a temporary directory.
pub fn test_config(dir: &Path, feeds: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.state_path = dir.join("state").join("seen.json");
    config.report_path = dir.join("output").join("daily.md").to_string_lossy().into_owned();
    config.delta_path = Some(dir.join("output").join("new_papers.json"));
    config.feeds = feeds.iter().map(|f| f.to_string()).collect();
    config.fetch.concurrency = 2;
    config
}
