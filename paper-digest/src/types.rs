use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::warn;

pub const UNTITLED: &str = "Untitled";

fn default_title() -> String {
    UNTITLED.to_string()
}

fn default_sent() -> bool {
    true
}

/// Default for records stored without a date. The next save writes this
/// day into the file, after which the record loads with it unchanged.
fn load_day() -> NaiveDate {
    Local::now().date_naive()
}

/// One paper in the corpus. `id` is the only deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    #[serde(default = "load_day")]
    pub date: NaiveDate,
    /// Whether a digest has already surfaced this record.
    /// Records written before this flag existed were already known.
    #[serde(default = "default_sent")]
    pub sent: bool,
}

/// The persisted set of paper records, newest first.
///
/// Every constructor keeps ids unique; records are only ever added through
/// [`Corpus::from_records`] or the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Corpus {
    records: Vec<PaperRecord>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from loaded records, repairing what would break the
    /// id invariant: an empty id falls back to the link, records with
    /// neither are dropped, and later duplicates of an id are dropped.
    pub fn from_records(records: Vec<PaperRecord>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());

        for mut record in records {
            if record.id.is_empty() {
                if record.link.is_empty() {
                    warn!("Dropping corpus record without id or link: {}", record.title);
                    continue;
                }
                record.id = record.link.clone();
            }
            if !seen.insert(record.id.clone()) {
                warn!("Dropping duplicate corpus record: {}", record.id);
                continue;
            }
            kept.push(record);
        }

        Self { records: kept }
    }

    pub(crate) fn from_unique(records: Vec<PaperRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PaperRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PaperRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&PaperRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> HashSet<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    /// Records no digest has consumed yet, in corpus order.
    pub fn unsent(&self) -> Vec<PaperRecord> {
        self.records.iter().filter(|r| !r.sent).cloned().collect()
    }

    /// Flag the given ids as surfaced. Returns how many records changed.
    pub fn mark_sent<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids: HashSet<&str> = ids.into_iter().collect();
        let mut changed = 0;
        for record in self.records.iter_mut() {
            if !record.sent && ids.contains(record.id.as_str()) {
                record.sent = true;
                changed += 1;
            }
        }
        changed
    }
}

impl<'de> Deserialize<'de> for Corpus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let records = Vec::<PaperRecord>::deserialize(deserializer)?;
        Ok(Corpus::from_records(records))
    }
}

/// A timestamp as a feed supplied it.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryTimestamp {
    /// Already parsed by the feed reader.
    Structured(DateTime<Utc>),
    /// Raw feed text the reader could not interpret.
    Text(String),
}

/// One entry as the feed source adapter hands it over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub authors: Vec<Option<String>>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub updated: Option<EntryTimestamp>,
    pub published: Option<EntryTimestamp>,
}

/// The result of fetching one feed endpoint.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub url: String,
    /// Display name used as the `source` of every record from this feed.
    pub title: String,
    pub entries: Vec<RawEntry>,
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub success: bool,
    pub error: Option<String>,
    pub response_time_ms: u64,
    pub http_status: Option<u16>,
    pub content: Option<Vec<u8>>, // RSS/Atom document
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    /// Number of feeds fetched at the same time.
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("paper-digest/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: 30,
            max_feed_size_mb: 10,
            max_redirects: 5,
            concurrency: 4,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corpus file not found: {} (run the fetch step first)", path.display())]
    CorpusMissing { path: PathBuf },

    #[error("Failed to write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
