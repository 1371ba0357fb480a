pub mod types;
pub mod traits;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod normalizer;
pub mod reconciler;
pub mod store;
pub mod llm_adapter;
pub mod digest;
pub mod aggregator;
pub mod rss_utils;

pub use types::*;
pub use traits::FeedSource;
pub use config::AppConfig;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use sources::RssFeedSource;
pub use normalizer::{normalize_entry, normalize_feed};
pub use reconciler::{reconcile, Reconciliation, RunKind};
pub use store::{CorpusOrigin, LoadedCorpus, SeenStore};
pub use llm_adapter::{ChatCompletionClient, MockSummarizer, Summarizer, SummaryError, SummaryRequest};
pub use digest::{DigestComposer, Narrative};
pub use aggregator::{DigestSummary, FetchSummary, PaperAggregator};
