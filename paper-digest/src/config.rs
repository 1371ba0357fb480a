use crate::llm_adapter::{SummarizerConfig, API_KEY_ENV};
use crate::rss_utils;
use crate::types::{AggregatorError, FetchConfig, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Journal feeds tracked when `PAPER_DIGEST_FEEDS` is not set
pub const DEFAULT_FEEDS: &[&str] = &[
    "http://www.nature.com/nature/current_issue/rss",
    "https://www.science.org/action/showFeed?type=etoc&feed=rss&jc=science",
    "https://www.science.org/action/showFeed?type=etoc&feed=rss&jc=sciadv",
    "https://www.nature.com/ngeo.rss",
    "https://www.nature.com/ncomms.rss",
    "https://www.nature.com/natrevearthenviron.rss",
    "https://www.pnas.org/action/showFeed?type=searchTopic&taxonomyCode=topic&tagCode=earth-sci",
    "https://www.annualreviews.org/rss/content/journals/earth/latestarticles?fmt=rss",
    "https://rss.sciencedirect.com/publication/science/00128252",
    "https://rss.sciencedirect.com/publication/science/0012821X",
    "https://agupubs.onlinelibrary.wiley.com/feed/19448007/most-recent",
    "https://agupubs.onlinelibrary.wiley.com/feed/21699356/most-recent",
    "https://agupubs.onlinelibrary.wiley.com/feed/15252027/most-recent",
    "https://rss.sciencedirect.com/publication/science/00167037",
];

pub const DEFAULT_STATE_PATH: &str = "state/seen.json";
pub const DEFAULT_REPORT_PATH: &str = "output/daily.md";
pub const DEFAULT_DELTA_PATH: &str = "output/new_papers.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Persisted corpus file
    pub state_path: PathBuf,
    /// Report path; may contain `{date}`
    pub report_path: String,
    /// Where the fetch step writes its delta, if anywhere
    pub delta_path: Option<PathBuf>,
    pub feeds: Vec<String>,
    pub fetch: FetchConfig,
    pub summarizer: SummarizerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            report_path: DEFAULT_REPORT_PATH.to_string(),
            delta_path: Some(PathBuf::from(DEFAULT_DELTA_PATH)),
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            fetch: FetchConfig::default(),
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("PAPER_DIGEST_STATE") {
            config.state_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("PAPER_DIGEST_REPORT") {
            config.report_path = path;
        }
        if let Some(path) = lookup("PAPER_DIGEST_DELTA") {
            config.delta_path = if path.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Some(feeds) = lookup("PAPER_DIGEST_FEEDS") {
            config.feeds = parse_feed_list(&feeds);
        }
        if let Some(n) = parse_var::<usize, _>(&lookup, "PAPER_DIGEST_CONCURRENCY")? {
            config.fetch.concurrency = n.max(1);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "PAPER_DIGEST_FETCH_TIMEOUT")? {
            config.fetch.timeout_seconds = secs;
        }

        config.summarizer.api_key = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty());
        if let Some(base) = lookup("PAPER_DIGEST_API_BASE") {
            config.summarizer.base_url = base;
        }
        if let Some(model) = lookup("PAPER_DIGEST_MODEL") {
            config.summarizer.model = model;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "PAPER_DIGEST_SUMMARY_TIMEOUT")? {
            config.summarizer.timeout_seconds = secs;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feeds.is_empty() {
            return Err(AggregatorError::Config("no feeds configured".to_string()));
        }
        if let Some(bad) = self.feeds.iter().find(|f| !rss_utils::url::is_valid_feed_url(f)) {
            return Err(AggregatorError::Config(format!("invalid feed URL: {}", bad)));
        }
        Ok(())
    }
}

fn parse_feed_list(raw: &str) -> Vec<String> {
    raw.split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AggregatorError::Config(format!("{} must be a number, got {:?}", key, raw))),
    }
}
