use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source tag for a [`StandardItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Reddit,
    Mastodon,
    Rss,
    Web,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Reddit => write!(f, "reddit"),
            Source::Mastodon => write!(f, "mastodon"),
            Source::Rss => write!(f, "rss"),
            Source::Web => write!(f, "web"),
        }
    }
}

/// An opaque scalar value carried in [`StandardItem::metadata`]. Never `Null`
/// by construction — see the invariant in the data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Integer(i) => Some(*i),
            MetaValue::Float(f) => Some(*f as i64),
            _ => None,
        }
    }
}

/// Normalized record produced by any source adapter (§3, §4.B).
///
/// Immutable after standardization: every field here is set once by the
/// adapter and never mutated by later stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: Source,
    pub url: Option<String>,
    pub collected_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, MetaValue>,
}

impl StandardItem {
    /// Known metadata accessor for the engagement/score metric, which is
    /// named `score`/`upvotes` on Reddit-like sources.
    pub fn score(&self) -> Option<i64> {
        self.metadata
            .get("score")
            .or_else(|| self.metadata.get("upvotes"))
            .and_then(MetaValue::as_i64)
    }

    /// Known metadata accessor for the Mastodon-like boost count. `boosts`
    /// and `reblogs_count` denote the same metric (see design notes §9).
    pub fn boosts(&self) -> Option<i64> {
        self.metadata
            .get("boosts")
            .or_else(|| self.metadata.get("reblogs_count"))
            .and_then(MetaValue::as_i64)
    }

    pub fn subreddit(&self) -> Option<&str> {
        self.metadata.get("subreddit").and_then(MetaValue::as_str)
    }

    /// Canonical source URL for dedup purposes: `source_url` metadata falls
    /// back to the item's own `url`.
    pub fn source_url(&self) -> Option<&str> {
        self.metadata
            .get("source_url")
            .and_then(MetaValue::as_str)
            .or(self.url.as_deref())
    }
}

/// The item's own `id` if non-empty; otherwise a deterministic
/// hash-prefixed fallback `topic_{hash12}`; only as a last resort (both
/// `id` and the content hash are empty) a random id. Used identically by
/// the collector (to derive a `TopicMessage.topic_id`) and the topic
/// processor (to find the same item back inside its collection blob) so
/// retried items never produce a second, diverging topic id (§4.E, §4.F).
pub fn topic_id_for(item: &StandardItem) -> String {
    if !item.id.trim().is_empty() {
        return item.id.clone();
    }
    let h = crate::hash::hash_content(&item.title, &item.content);
    if h.len() >= 12 {
        return format!("topic_{}", &h[..12]);
    }
    format!("topic_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boosts_falls_back_to_reblogs_count() {
        let mut metadata = HashMap::new();
        metadata.insert("reblogs_count".to_string(), MetaValue::Integer(7));
        let item = StandardItem {
            id: "1".into(),
            title: "t".into(),
            content: "c".into(),
            source: Source::Mastodon,
            url: None,
            collected_at: Utc::now(),
            metadata,
        };
        assert_eq!(item.boosts(), Some(7));
    }

    #[test]
    fn source_url_falls_back_to_url() {
        let item = StandardItem {
            id: "1".into(),
            title: "t".into(),
            content: "c".into(),
            source: Source::Rss,
            url: Some("https://example.com/a".into()),
            collected_at: Utc::now(),
            metadata: HashMap::new(),
        };
        assert_eq!(item.source_url(), Some("https://example.com/a"));
    }
}
