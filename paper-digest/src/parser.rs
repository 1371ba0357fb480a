use crate::types::{AggregatorError, EntryTimestamp, RawEntry, Result};
use feed_rs::parser;
use tracing::{debug, info};

/// A parsed feed document before normalization.
#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<RawEntry>,
}

pub struct FeedParser;

impl FeedParser {
    pub fn parse_feed(content: &[u8]) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        // Entries without a native id keep an empty one instead of a
        // generated hash of link and title, so the link can stand in for it
        let feed = parser::Builder::new()
            .id_generator(|_links, _title, _uri| String::new())
            .build()
            .parse(content)
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty());

        let entries: Vec<RawEntry> = feed.entries.into_iter().map(Self::parse_entry).collect();

        info!("Parsed feed with {} entries", entries.len());

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> RawEntry {
        let id = Some(entry.id).filter(|id| !id.trim().is_empty());

        // Prefer the alternate link, fall back to the first one listed
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone());

        let authors = entry
            .authors
            .into_iter()
            .map(|a| Some(a.name).filter(|n| !n.trim().is_empty()))
            .collect();

        RawEntry {
            id,
            title: entry.title.map(|t| t.content),
            link,
            authors,
            summary: entry.summary.map(|s| s.content),
            content: entry.content.and_then(|c| c.body),
            updated: entry.updated.map(EntryTimestamp::Structured),
            published: entry.published.map(EntryTimestamp::Structured),
        }
    }

    pub fn is_valid_feed_content(content: &str) -> bool {
        let content_lower = content.to_lowercase();

        let has_feed_indicators = content_lower.contains("<rss")
            || content_lower.contains("<feed")
            || content_lower.contains("<rdf:rdf")
            || content_lower.contains("<channel");

        let has_xml_declaration = content.trim_start().starts_with("<?xml");

        has_feed_indicators && (has_xml_declaration || content_lower.contains('<'))
    }
}
