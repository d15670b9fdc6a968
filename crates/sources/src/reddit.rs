//! Reddit adapter — public JSON listing API, no auth required.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use gazette_core::item::{MetaValue, Source, StandardItem};
use serde_json::Value;
use tracing::warn;

use crate::adapter::{quota_per_target, SourceAdapter};

pub struct RedditAdapter {
    pub subreddits: Vec<String>,
    pub sort: String,
    pub time_filter: String,
    pub allow_nsfw: bool,
}

impl RedditAdapter {
    pub fn new(subreddits: Vec<String>) -> Self {
        Self { subreddits, sort: "hot".to_string(), time_filter: "day".to_string(), allow_nsfw: false }
    }
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    fn source_name(&self) -> &'static str {
        "reddit"
    }

    async fn collect(&self, fetcher: &gazette_fetch::RateLimitedFetcher, max_items: usize) -> Vec<StandardItem> {
        let per_target = quota_per_target(max_items, self.subreddits.len());
        let mut items = Vec::new();

        for subreddit in &self.subreddits {
            let url = format!(
                "https://www.reddit.com/r/{subreddit}/{sort}.json?limit={limit}&t={time}&raw_json=1",
                subreddit = subreddit,
                sort = self.sort,
                limit = per_target,
                time = self.time_filter,
            );

            let body = match fetcher.get("reddit", &url).await {
                Ok(body) => body,
                Err(err) => {
                    warn!(subreddit, error = %err, "reddit collection failed, continuing");
                    continue;
                }
            };

            match parse_reddit_listing(&body, subreddit, self.allow_nsfw) {
                Ok(mut parsed) => items.append(&mut parsed),
                Err(err) => {
                    warn!(subreddit, error = %err, "reddit listing parse failed, continuing");
                    continue;
                }
            }
        }

        items.truncate(max_items);
        items
    }
}

fn parse_reddit_listing(body: &str, subreddit: &str, allow_nsfw: bool) -> Result<Vec<StandardItem>, String> {
    let data: Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let children = data["data"]["children"].as_array().ok_or("missing data.children")?;

    let mut items = Vec::with_capacity(children.len());
    for child in children {
        let post = &child["data"];

        if post["stickied"].as_bool().unwrap_or(false) {
            continue;
        }
        if post["author"].as_str() == Some("[deleted]") {
            continue;
        }
        if !allow_nsfw && post["over_18"].as_bool().unwrap_or(false) {
            continue;
        }

        if let Some(item) = standardize_reddit_post(post, subreddit) {
            items.push(item);
        }
    }
    Ok(items)
}

/// Pure conversion of one raw Reddit post to a `StandardItem`.
fn standardize_reddit_post(post: &Value, subreddit: &str) -> Option<StandardItem> {
    let id = post["id"].as_str()?;
    let title = post["title"].as_str().unwrap_or("").to_string();
    if title.is_empty() {
        return None;
    }

    let permalink = post["permalink"].as_str().unwrap_or("");
    let url = format!("https://www.reddit.com{permalink}");

    let selftext = post["selftext"].as_str().unwrap_or("");
    let link_url = post["url"].as_str().unwrap_or("");
    let content = if !selftext.is_empty() {
        selftext.chars().take(2000).collect::<String>()
    } else if !link_url.is_empty() && !link_url.starts_with("https://www.reddit.com/") {
        format!("Link: {link_url}")
    } else {
        String::new()
    };

    let created_utc = post["created_utc"].as_f64().unwrap_or(0.0) as i64;
    let collected_at = Utc.timestamp_opt(created_utc, 0).single().unwrap_or_else(Utc::now);

    let mut metadata = std::collections::HashMap::new();
    metadata.insert("subreddit".to_string(), MetaValue::Text(subreddit.to_string()));
    metadata.insert("score".to_string(), MetaValue::Integer(post["score"].as_i64().unwrap_or(0)));
    metadata.insert("num_comments".to_string(), MetaValue::Integer(post["num_comments"].as_i64().unwrap_or(0)));

    Some(StandardItem {
        id: format!("reddit_{id}"),
        title,
        content,
        source: Source::Reddit,
        url: Some(url),
        collected_at,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing() -> Value {
        serde_json::json!({
            "data": {
                "children": [
                    {"data": {
                        "id": "abc123",
                        "title": "New async runtime released",
                        "selftext": "Details about the runtime and its API.",
                        "url": "https://www.reddit.com/r/rust/comments/abc123/",
                        "permalink": "/r/rust/comments/abc123/new_async_runtime_released/",
                        "author": "someuser",
                        "score": 150,
                        "num_comments": 20,
                        "created_utc": 1_700_000_000.0,
                        "stickied": false,
                        "over_18": false
                    }},
                    {"data": {
                        "id": "sticky1",
                        "title": "Weekly thread",
                        "stickied": true
                    }},
                    {"data": {
                        "id": "deleted1",
                        "title": "gone",
                        "author": "[deleted]"
                    }}
                ]
            }
        });
    }

    #[test]
    fn parses_post_and_skips_stickied_and_deleted() {
        let body = sample_listing().to_string();
        let items = parse_reddit_listing(&body, "rust", false).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "reddit_abc123");
        assert_eq!(items[0].subreddit(), Some("rust"));
        assert_eq!(items[0].score(), Some(150));
    }

    #[test]
    fn link_post_falls_back_to_link_content() {
        let post = serde_json::json!({
            "id": "link1",
            "title": "Check this out",
            "url": "https://example.com/article",
            "permalink": "/r/rust/comments/link1/",
            "created_utc": 1_700_000_000.0,
            "score": 10,
        });
        let item = standardize_reddit_post(&post, "rust").unwrap();
        assert_eq!(item.content, "Link: https://example.com/article");
    }
}
