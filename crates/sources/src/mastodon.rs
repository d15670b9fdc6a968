//! Mastodon adapter — public timeline API (no auth for public timelines).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gazette_core::item::{MetaValue, Source, StandardItem};
use serde_json::Value;
use tracing::warn;

use crate::adapter::{quota_per_target, SourceAdapter};

pub struct MastodonAdapter {
    pub instance_hosts: Vec<String>,
    pub timeline_kind: String,
    pub min_favourites: i64,
}

impl MastodonAdapter {
    pub fn new(instance_hosts: Vec<String>) -> Self {
        Self { instance_hosts, timeline_kind: "public".to_string(), min_favourites: 0 }
    }
}

#[async_trait]
impl SourceAdapter for MastodonAdapter {
    fn source_name(&self) -> &'static str {
        "mastodon"
    }

    async fn collect(&self, fetcher: &gazette_fetch::RateLimitedFetcher, max_items: usize) -> Vec<StandardItem> {
        let per_target = quota_per_target(max_items, self.instance_hosts.len());
        let mut items = Vec::new();

        for host in &self.instance_hosts {
            let url = format!(
                "https://{host}/api/v1/timelines/{kind}?limit={limit}",
                host = host,
                kind = self.timeline_kind,
                limit = per_target,
            );

            let body = match fetcher.get("mastodon", &url).await {
                Ok(body) => body,
                Err(err) => {
                    warn!(host, error = %err, "mastodon collection failed, continuing");
                    continue;
                }
            };

            match parse_timeline(&body, self.min_favourites) {
                Ok(mut parsed) => items.append(&mut parsed),
                Err(err) => {
                    warn!(host, error = %err, "mastodon timeline parse failed, continuing");
                    continue;
                }
            }
        }

        items.truncate(max_items);
        items
    }
}

fn parse_timeline(body: &str, min_favourites: i64) -> Result<Vec<StandardItem>, String> {
    let statuses: Vec<Value> = serde_json::from_str(body).map_err(|e| e.to_string())?;

    let mut items = Vec::with_capacity(statuses.len());
    for status in &statuses {
        if status["in_reply_to_id"].is_string() {
            continue;
        }
        if status["sensitive"].as_bool().unwrap_or(false) {
            continue;
        }
        if status["favourites_count"].as_i64().unwrap_or(0) < min_favourites {
            continue;
        }

        if let Some(item) = standardize_status(status) {
            items.push(item);
        }
    }
    Ok(items)
}

/// Pure conversion of one raw Mastodon status to a `StandardItem`.
fn standardize_status(status: &Value) -> Option<StandardItem> {
    let id = status["id"].as_str()?;
    let url = status["url"].as_str().map(|s| s.to_string());
    let title_source = status["content"].as_str().unwrap_or("");
    let plain = strip_html(title_source);
    if plain.trim().is_empty() {
        return None;
    }

    let title = plain.chars().take(80).collect::<String>();
    let collected_at = status["created_at"]
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let mut metadata = std::collections::HashMap::new();
    metadata.insert(
        "boosts".to_string(),
        MetaValue::Integer(status["reblogs_count"].as_i64().unwrap_or(0)),
    );
    metadata.insert(
        "favourites".to_string(),
        MetaValue::Integer(status["favourites_count"].as_i64().unwrap_or(0)),
    );

    Some(StandardItem {
        id: format!("mastodon_{id}"),
        title,
        content: plain,
        source: Source::Mastodon,
        url,
        collected_at,
        metadata,
    })
}

fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boosts_accessor_reads_reblogs_count_via_metadata() {
        let status = serde_json::json!({
            "id": "1",
            "content": "<p>A post about async Rust runtimes and their tradeoffs.</p>",
            "reblogs_count": 12,
            "favourites_count": 5,
            "created_at": "2025-10-08T12:00:00Z",
            "url": "https://mastodon.social/@user/1"
        });
        let item = standardize_status(&status).unwrap();
        assert_eq!(item.boosts(), Some(12));
    }

    #[test]
    fn replies_and_sensitive_are_filtered() {
        let statuses = serde_json::json!([
            {"id": "1", "in_reply_to_id": "0", "content": "reply"},
            {"id": "2", "sensitive": true, "content": "nsfw content"},
            {"id": "3", "content": "A genuinely interesting technical post about systems.", "created_at": "2025-10-08T12:00:00Z"}
        ]);
        let items = parse_timeline(&statuses.to_string(), 0).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "mastodon_3");
    }
}
