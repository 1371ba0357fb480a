/// Feed-specific utility functions

/// URL utilities for feed endpoints
pub mod url {
    use url::Url;

    /// Extract domain from URL
    pub fn extract_domain(url_str: &str) -> Option<String> {
        Url::parse(url_str)
            .ok()
            .and_then(|url| url.domain().map(|d| d.to_string()))
    }

    /// Validate feed URL format
    pub fn is_valid_feed_url(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => (url.scheme() == "http" || url.scheme() == "https") && url.host().is_some(),
            Err(_) => false,
        }
    }

    /// Display name for a feed that carries no title of its own
    pub fn fallback_source_name(url_str: &str) -> String {
        match extract_domain(url_str) {
            Some(domain) => format!("RSS Feed ({})", domain),
            None => "Unknown source".to_string(),
        }
    }
}

/// Text cleanup for feed content
pub mod feed {
    /// Extract clean text content from HTML
    pub fn extract_text_from_html(html: &str) -> String {
        let mut stripped = String::with_capacity(html.len());
        let mut tag: Option<String> = None;

        for c in html.chars() {
            if let Some(name) = tag.as_mut() {
                if c == '>' {
                    // Block-level tags separate words, inline ones (<sub>, <i>) do not
                    if is_block_tag(name) {
                        stripped.push(' ');
                    }
                    tag = None;
                } else {
                    name.push(c);
                }
            } else if c == '<' {
                tag = Some(String::new());
            } else {
                stripped.push(c);
            }
        }

        decode_entities(&stripped)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_block_tag(raw: &str) -> bool {
        let name: String = raw
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        matches!(
            name.as_str(),
            "p" | "br" | "div" | "li" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
                | "tr" | "td" | "blockquote" | "section"
        )
    }

    /// Single pass, so "&amp;lt;" decodes to "&lt;" and not "<"
    fn decode_entities(text: &str) -> String {
        let mut decoded = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(amp) = rest.find('&') {
            decoded.push_str(&rest[..amp]);
            let tail = &rest[amp + 1..];
            let entity = tail
                .find(';')
                .filter(|&end| end > 0 && end <= 10)
                .and_then(|end| decode_entity(&tail[..end]).map(|c| (c, end)));

            match entity {
                Some((c, end)) => {
                    decoded.push(c);
                    rest = &tail[end + 1..];
                }
                None => {
                    decoded.push('&');
                    rest = tail;
                }
            }
        }

        decoded.push_str(rest);
        decoded
    }

    fn decode_entity(name: &str) -> Option<char> {
        match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            "ndash" => Some('\u{2013}'),
            "mdash" => Some('\u{2014}'),
            _ => {
                let digits = name.strip_prefix('#')?;
                let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                    None => digits.parse::<u32>().ok()?,
                };
                char::from_u32(code)
            }
        }
    }
}
