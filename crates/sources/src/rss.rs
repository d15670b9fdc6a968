//! RSS/Atom adapter. No engagement metric exists for feed entries; content
//! comes from `<description>`/`<content:encoded>` via `feed-rs`.

use async_trait::async_trait;
use chrono::Utc;
use gazette_core::item::{Source, StandardItem};
use tracing::warn;

use crate::adapter::{quota_per_target, SourceAdapter};

pub struct RssAdapter {
    pub feed_urls: Vec<String>,
}

impl RssAdapter {
    pub fn new(feed_urls: Vec<String>) -> Self {
        Self { feed_urls }
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    fn source_name(&self) -> &'static str {
        "rss"
    }

    async fn collect(&self, fetcher: &gazette_fetch::RateLimitedFetcher, max_items: usize) -> Vec<StandardItem> {
        let per_target = quota_per_target(max_items, self.feed_urls.len());
        let mut items = Vec::new();

        for feed_url in &self.feed_urls {
            let body = match fetcher.get("rss", feed_url).await {
                Ok(body) => body,
                Err(err) => {
                    warn!(feed_url, error = %err, "rss collection failed, continuing");
                    continue;
                }
            };

            match parse_feed(&body, per_target) {
                Ok(mut parsed) => items.append(&mut parsed),
                Err(err) => {
                    warn!(feed_url, error = %err, "rss feed parse failed, continuing");
                    continue;
                }
            }
        }

        items.truncate(max_items);
        items
    }
}

fn parse_feed(body: &str, limit: usize) -> Result<Vec<StandardItem>, String> {
    let feed = feed_rs::parser::parse(body.as_bytes()).map_err(|e| e.to_string())?;

    let mut items = Vec::new();
    for entry in feed.entries.into_iter().take(limit) {
        if let Some(item) = standardize_entry(entry) {
            items.push(item);
        }
    }
    Ok(items)
}

/// Pure conversion of one feed entry to a `StandardItem`.
fn standardize_entry(entry: feed_rs::model::Entry) -> Option<StandardItem> {
    let title = entry.title.map(|t| t.content).unwrap_or_default();
    if title.trim().is_empty() {
        return None;
    }

    let content = entry
        .content
        .and_then(|c| c.body)
        .or_else(|| entry.summary.map(|s| s.content))
        .unwrap_or_default();

    let url = entry.links.first().map(|l| l.href.clone());
    let collected_at = entry.published.or(entry.updated).unwrap_or_else(Utc::now);

    Some(StandardItem {
        id: format!("rss_{}", entry.id),
        title,
        content,
        source: Source::Rss,
        url,
        collected_at,
        metadata: std::collections::HashMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Feed</title>
    <item>
      <title>A technical deep dive into async runtimes</title>
      <description>This article explores how modern async runtimes schedule work across threads.</description>
      <link>https://example.com/async-runtimes</link>
      <guid>https://example.com/async-runtimes</guid>
      <pubDate>Wed, 08 Oct 2025 12:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_rss_item_into_standard_item() {
        let items = parse_feed(SAMPLE_RSS, 10).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "A technical deep dive into async runtimes");
        assert!(items[0].content.contains("async runtimes"));
        assert_eq!(items[0].url.as_deref(), Some("https://example.com/async-runtimes"));
    }

    #[test]
    fn respects_limit() {
        let items = parse_feed(SAMPLE_RSS, 0).unwrap();
        assert!(items.is_empty());
    }
}
