use crate::llm_adapter::SummaryError;
use crate::types::PaperRecord;
use chrono::NaiveDate;
use std::fmt::Write;
use std::path::PathBuf;
use tracing::{debug, info};

pub const NO_NEW_ITEMS: &str = "No new papers today.";
pub const EMPTY_NARRATIVE: &str = "The summarization service returned no text.";

/// The trend narrative shown at the top of a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrative {
    Generated(String),
    /// Nothing new, so no summary was requested.
    NoNewItems,
    /// The summarizer failed; carries the reason shown to the reader.
    Failed(String),
}

impl Narrative {
    pub fn from_result(result: std::result::Result<String, SummaryError>) -> Self {
        match result {
            Ok(text) => Narrative::Generated(text),
            Err(e) => Narrative::Failed(e.to_string()),
        }
    }

    /// Text placed in the report. Never empty.
    pub fn text(&self) -> String {
        match self {
            Narrative::Generated(text) if !text.trim().is_empty() => text.trim().to_string(),
            Narrative::Generated(_) => EMPTY_NARRATIVE.to_string(),
            Narrative::NoNewItems => NO_NEW_ITEMS.to_string(),
            Narrative::Failed(reason) => format!("Summary generation failed: {}", reason),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Narrative::Generated(_) => "generated",
            Narrative::NoNewItems => "no new items",
            Narrative::Failed(_) => "failed",
        }
    }
}

/// Renders the daily Markdown report
pub struct DigestComposer;

impl DigestComposer {
    /// Render a report for `delta`. The records are shown as given: no
    /// filtering or deduplication happens here.
    pub fn compose(
        date: NaiveDate,
        delta: &[PaperRecord],
        corpus_size: usize,
        narrative: &Narrative,
    ) -> String {
        info!("Composing digest for {} with {} new papers", date, delta.len());

        let narrative_text = if delta.is_empty() {
            Narrative::NoNewItems.text()
        } else {
            narrative.text()
        };

        let mut report = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(report, "# Daily Paper Digest: {}\n", date.format("%Y-%m-%d"));
        let _ = writeln!(report, "**New papers**: {}\n", delta.len());
        let _ = writeln!(report, "**Total papers tracked**: {}\n", corpus_size);
        let _ = writeln!(report, "## Summary\n");
        let _ = writeln!(report, "{}\n", narrative_text);

        if !delta.is_empty() {
            report.push_str("---\n\n## Papers\n\n");
            for (i, paper) in delta.iter().enumerate() {
                Self::write_entry(&mut report, i + 1, paper);
            }
        }

        debug!("Digest is {} bytes", report.len());
        report
    }

    fn write_entry(report: &mut String, index: usize, paper: &PaperRecord) {
        let authors = if paper.authors.is_empty() {
            "Unknown".to_string()
        } else {
            paper.authors.join(", ")
        };
        let source = if paper.source.is_empty() {
            "Unknown"
        } else {
            paper.source.as_str()
        };

        let _ = writeln!(report, "### {}. {}", index, paper.title);
        let _ = writeln!(report, "- **Authors**: {}", authors);
        let _ = writeln!(report, "- **Source**: {}", source);
        if paper.link.is_empty() {
            let _ = writeln!(report, "- **Link**: none");
        } else {
            let _ = writeln!(report, "- **Link**: [{}]({})", paper.link, paper.link);
        }
        if !paper.summary.is_empty() {
            let _ = writeln!(report, "- **Abstract**: {}", paper.summary);
        }
        report.push('\n');
    }

    /// Resolve a report path template; `{date}` becomes the report date.
    pub fn output_path(template: &str, date: NaiveDate) -> PathBuf {
        PathBuf::from(template.replace("{date}", &date.format("%Y-%m-%d").to_string()))
    }
}
