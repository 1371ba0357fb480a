use crate::rss_utils::feed::extract_text_from_html;
use crate::types::{EntryTimestamp, FetchedFeed, PaperRecord, RawEntry, UNTITLED};
use chrono::{DateTime, NaiveDate};
use tracing::{debug, warn};

/// Records produced from one feed, plus how many entries had no usable key.
#[derive(Debug, Default)]
pub struct NormalizedFeed {
    pub records: Vec<PaperRecord>,
    pub skipped: usize,
}

/// Turn one raw entry into a paper record.
///
/// Returns `None` when the entry has neither an identifier nor a link, since
/// there is nothing to deduplicate it by. The record starts out unsent; the
/// reconciler decides its final flag.
pub fn normalize_entry(entry: &RawEntry, source: &str, processing_day: NaiveDate) -> Option<PaperRecord> {
    // Keys are kept byte-for-byte; only blank values count as absent
    let link = present(entry.link.as_deref()).unwrap_or_default();
    let id = present(entry.id.as_deref()).or_else(|| present(Some(link.as_str())))?;

    let title = entry
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED)
        .to_string();

    let summary = entry
        .summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or(entry.content.as_deref())
        .map(extract_text_from_html)
        .unwrap_or_default();

    let authors = entry
        .authors
        .iter()
        .filter_map(|name| non_empty(name.as_deref()))
        .collect();

    let date = resolve_date(entry, &id, processing_day);

    Some(PaperRecord {
        id,
        title,
        link,
        authors,
        summary,
        source: source.to_string(),
        date,
        sent: false,
    })
}

/// Normalize every entry of a fetched feed, keeping feed order.
pub fn normalize_feed(feed: &FetchedFeed, processing_day: NaiveDate) -> NormalizedFeed {
    let mut normalized = NormalizedFeed::default();

    for entry in &feed.entries {
        match normalize_entry(entry, &feed.title, processing_day) {
            Some(record) => normalized.records.push(record),
            None => {
                debug!("Skipping entry without id or link in {}", feed.url);
                normalized.skipped += 1;
            }
        }
    }

    normalized
}

/// Publication day of an entry: its update time, else its publish time,
/// else the processing day. Unreadable timestamps are logged and skipped.
fn resolve_date(entry: &RawEntry, id: &str, processing_day: NaiveDate) -> NaiveDate {
    for timestamp in [&entry.updated, &entry.published].into_iter().flatten() {
        match timestamp_to_date(timestamp) {
            Some(date) => return date,
            None => warn!(
                "Unparseable timestamp {:?} on entry {}, trying next fallback",
                timestamp, id
            ),
        }
    }
    processing_day
}

/// Calendar day of a timestamp in UTC. Offsets are applied before the day
/// is taken, so `2024-03-02T00:30:00+08:00` lands on 2024-03-01.
pub fn timestamp_to_date(timestamp: &EntryTimestamp) -> Option<NaiveDate> {
    match timestamp {
        EntryTimestamp::Structured(dt) => Some(dt.date_naive()),
        EntryTimestamp::Text(text) => parse_date_text(text.trim()),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .map(|dt| dt.naive_utc().date())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
}

fn present(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
