//! Merge of freshly normalized records into the persisted corpus.
//!
//! Reconciliation runs in two phases. The run is classified from the loaded
//! corpus alone (empty means bootstrap), and only then are fresh records
//! merged. Nothing observed during the merge can change the classification.

use crate::types::{Corpus, PaperRecord};
use tracing::{debug, info};

/// How the loaded corpus classifies this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// No prior records: everything fetched is recorded as already surfaced.
    Bootstrap,
    /// Prior records exist: unseen records form the delta.
    Incremental,
}

impl RunKind {
    pub fn classify(prior: &Corpus) -> Self {
        if prior.is_empty() {
            RunKind::Bootstrap
        } else {
            RunKind::Incremental
        }
    }
}

/// Outcome of one merge.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub kind: RunKind,
    /// Updated corpus: this run's new records first, then the prior corpus.
    pub corpus: Corpus,
    /// Records new in this run that a digest should surface.
    pub delta: Vec<PaperRecord>,
    /// Records inserted as already surfaced on a bootstrap run.
    pub bootstrapped: usize,
    /// Fresh records dropped because their id was already known.
    pub duplicates: usize,
}

impl Reconciliation {
    pub fn is_first_run(&self) -> bool {
        self.kind == RunKind::Bootstrap
    }
}

/// Merge `fresh` (in feed traversal order) into `prior`.
///
/// The first occurrence of an id wins, whether the earlier occurrence is in
/// the prior corpus or earlier in `fresh`. Prior records are never dropped
/// or modified.
pub fn reconcile(prior: Corpus, fresh: Vec<PaperRecord>) -> Reconciliation {
    let kind = RunKind::classify(&prior);
    let mut seen_ids = prior.ids();

    let mut added = Vec::new();
    let mut delta = Vec::new();
    let mut duplicates = 0;

    for mut record in fresh {
        if !seen_ids.insert(record.id.clone()) {
            debug!("Skipping known entry: {}", record.id);
            duplicates += 1;
            continue;
        }

        match kind {
            RunKind::Bootstrap => {
                record.sent = true;
                added.push(record);
            }
            RunKind::Incremental => {
                record.sent = false;
                delta.push(record.clone());
                added.push(record);
            }
        }
    }

    let bootstrapped = match kind {
        RunKind::Bootstrap => added.len(),
        RunKind::Incremental => 0,
    };

    let mut records = added;
    records.extend(prior.into_records());
    let corpus = Corpus::from_unique(records);

    info!(
        "Reconciled {:?} run: {} new, {} bootstrapped, {} already known, corpus size {}",
        kind,
        delta.len(),
        bootstrapped,
        duplicates,
        corpus.len()
    );

    Reconciliation {
        kind,
        corpus,
        delta,
        bootstrapped,
        duplicates,
    }
}
