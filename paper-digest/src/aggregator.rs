use crate::config::AppConfig;
use crate::digest::{DigestComposer, Narrative};
use crate::llm_adapter::{ChatCompletionClient, Summarizer, SummaryRequest};
use crate::normalizer::normalize_feed;
use crate::reconciler::reconcile;
use crate::store::{self, CorpusOrigin, SeenStore};
use crate::traits::FeedSource;
use crate::types::{AggregatorError, FetchedFeed, PaperRecord, Result};
use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Counts reported by one fetch step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSummary {
    pub feeds_total: usize,
    pub feeds_failed: usize,
    pub entries_seen: usize,
    pub entries_skipped: usize,
    pub new_records: usize,
    pub bootstrapped: usize,
    pub corpus_size: usize,
    pub first_run: bool,
}

/// Outcome of one digest step.
#[derive(Debug, Clone)]
pub struct DigestSummary {
    pub report_path: PathBuf,
    pub new_records: usize,
    pub corpus_size: usize,
    pub narrative: Narrative,
}

/// Runs the fetch and digest steps against one persisted corpus.
///
/// The two steps are independent invocations; neither holds any state
/// between calls beyond what is on disk. Invocations against the same
/// corpus must not overlap.
pub struct PaperAggregator {
    config: AppConfig,
    store: SeenStore,
}

impl PaperAggregator {
    pub fn new(config: AppConfig) -> Self {
        let store = SeenStore::new(config.state_path.clone());
        Self { config, store }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &SeenStore {
        &self.store
    }

    /// Fetch every configured feed and merge new papers into the corpus.
    pub async fn run_fetch(&self, source: &dyn FeedSource) -> Result<FetchSummary> {
        self.run_fetch_on(source, Local::now().date_naive()).await
    }

    /// [`run_fetch`](Self::run_fetch) with an explicit processing day.
    pub async fn run_fetch_on(&self, source: &dyn FeedSource, today: NaiveDate) -> Result<FetchSummary> {
        // The run is classified from this load, before anything is fetched
        let loaded = self.store.load();
        if let CorpusOrigin::Unreadable { reason, .. } = &loaded.origin {
            warn!("Starting from an empty corpus because the stored one was unreadable: {}", reason);
        }

        let feeds = self.fetch_all_feeds(source).await;
        let feeds_failed = self.config.feeds.len() - feeds.len();

        let mut fresh: Vec<PaperRecord> = Vec::new();
        let mut entries_seen = 0;
        let mut entries_skipped = 0;
        for feed in &feeds {
            entries_seen += feed.entries.len();
            let normalized = normalize_feed(feed, today);
            entries_skipped += normalized.skipped;
            fresh.extend(normalized.records);
        }

        let reconciliation = reconcile(loaded.corpus, fresh);

        self.store.save(&reconciliation.corpus).map_err(|e| {
            error!("Failed to persist corpus: {}", e);
            e
        })?;

        if let Some(delta_path) = &self.config.delta_path {
            match store::write_json_atomic(delta_path, &reconciliation.delta) {
                Ok(()) => info!("Wrote {} new papers to {}", reconciliation.delta.len(), delta_path.display()),
                Err(e) => warn!("Could not write delta file {}: {}", delta_path.display(), e),
            }
        }

        let summary = FetchSummary {
            feeds_total: self.config.feeds.len(),
            feeds_failed,
            entries_seen,
            entries_skipped,
            new_records: reconciliation.delta.len(),
            bootstrapped: reconciliation.bootstrapped,
            corpus_size: reconciliation.corpus.len(),
            first_run: reconciliation.is_first_run(),
        };
        info!("Fetch complete: {:?}", summary);
        Ok(summary)
    }

    /// Fetch the configured feeds with bounded concurrency. Results come back
    /// in configuration order; failed feeds are logged and left out.
    async fn fetch_all_feeds(&self, source: &dyn FeedSource) -> Vec<FetchedFeed> {
        info!(
            "Fetching {} feeds via {} ({} at a time)",
            self.config.feeds.len(),
            source.source_name(),
            self.config.fetch.concurrency
        );

        let results: Vec<(&String, Result<FetchedFeed>)> = stream::iter(self.config.feeds.iter())
            .map(|url| async move { (url, source.fetch(url).await) })
            .buffered(self.config.fetch.concurrency.max(1))
            .collect()
            .await;

        let mut feeds = Vec::with_capacity(results.len());
        for (url, result) in results {
            match result {
                Ok(feed) => feeds.push(feed),
                Err(e) => warn!("Skipping feed {}: {}", url, e),
            }
        }

        info!("Fetched {}/{} feeds", feeds.len(), self.config.feeds.len());
        feeds
    }

    /// Write today's report using the configured chat-completions service.
    pub async fn run_digest(&self) -> Result<DigestSummary> {
        let summarizer_config = self.config.summarizer.clone();
        self.run_digest_with(Local::now().date_naive(), move || {
            let client = ChatCompletionClient::new(&summarizer_config)?;
            Ok(Arc::new(client) as Arc<dyn Summarizer>)
        })
        .await
    }

    /// Write the report for `today`. `make_summarizer` is only called when
    /// there is something new to summarize; its error aborts the step before
    /// anything is written.
    pub async fn run_digest_with<F>(&self, today: NaiveDate, make_summarizer: F) -> Result<DigestSummary>
    where
        F: FnOnce() -> Result<Arc<dyn Summarizer>>,
    {
        let loaded = self.store.load();
        if loaded.origin == CorpusOrigin::Missing {
            return Err(AggregatorError::CorpusMissing {
                path: self.store.path().to_path_buf(),
            });
        }
        let mut corpus = loaded.corpus;
        let delta = corpus.unsent();

        let narrative = if delta.is_empty() {
            info!("No new papers; skipping summarization");
            Narrative::NoNewItems
        } else {
            let summarizer = make_summarizer()?;
            let request = SummaryRequest::from_records(today, &delta);
            let narrative = Narrative::from_result(summarizer.summarize(&request).await);
            if let Narrative::Failed(reason) = &narrative {
                warn!("{} failed: {}", summarizer.adapter_name(), reason);
            }
            narrative
        };

        let report = DigestComposer::compose(today, &delta, corpus.len(), &narrative);
        let report_path = DigestComposer::output_path(&self.config.report_path, today);
        store::write_atomic(&report_path, report.as_bytes())?;
        info!("Wrote digest to {}", report_path.display());

        let marked = corpus.mark_sent(delta.iter().map(|r| r.id.as_str()));
        if marked > 0 {
            self.store.save(&corpus)?;
        }

        Ok(DigestSummary {
            report_path,
            new_records: delta.len(),
            corpus_size: corpus.len(),
            narrative,
        })
    }
}
