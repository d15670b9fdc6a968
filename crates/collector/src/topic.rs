//! Topic message construction (§4.E): derives `topic_id` and `priority_score`
//! from a surviving `StandardItem`.

pub use gazette_core::topic_id_for;

use gazette_core::item::{MetaValue, StandardItem};
use gazette_core::message::TopicMessage;
use gazette_quality::score_item;

pub fn build_topic_message(item: &StandardItem, collection_id: &str, collection_blob: &str) -> TopicMessage {
    let priority_score = score_item(&item.title, &item.content, item.url.as_deref()).total;

    TopicMessage {
        topic_id: topic_id_for(item),
        title: item.title.clone(),
        source: item.source.to_string(),
        collected_at: item.collected_at,
        priority_score,
        collection_id: collection_id.to_string(),
        collection_blob: collection_blob.to_string(),
        subreddit: item.subreddit().map(str::to_string),
        url: item.url.clone(),
        upvotes: item.score(),
        comments: item.metadata.get("num_comments").and_then(MetaValue::as_i64),
        boosts: item.boosts(),
        author: item.metadata.get("author").and_then(MetaValue::as_str).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gazette_core::item::Source;
    use std::collections::HashMap;

    fn item(id: &str) -> StandardItem {
        StandardItem {
            id: id.into(),
            title: "A Technical Deep Dive Into Rust".into(),
            content: "Plenty of technical content about software development here.".into(),
            source: Source::Reddit,
            url: None,
            collected_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn uses_item_id_when_present() {
        assert_eq!(topic_id_for(&item("abc123")), "abc123");
    }

    #[test]
    fn falls_back_to_hash_prefixed_id_when_empty() {
        let id = topic_id_for(&item(""));
        assert!(id.starts_with("topic_"));
        assert_eq!(id.len(), "topic_".len() + 12);
    }

    #[test]
    fn fallback_is_deterministic_for_same_content() {
        let a = topic_id_for(&item(""));
        let b = topic_id_for(&item(""));
        assert_eq!(a, b, "retried items must not produce a new topic_id");
    }

    #[test]
    fn priority_score_in_unit_range() {
        let msg = build_topic_message(&item("x"), "col-1", "collections/2025/10/08/collection_1.json");
        assert!((0.0..=1.0).contains(&msg.priority_score));
    }
}
