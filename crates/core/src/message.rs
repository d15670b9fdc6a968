//! Queue message envelope and the `process_topic` payload (§3, §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope wrapping every queue message regardless of operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<P> {
    pub operation: String,
    pub service_name: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
    pub payload: P,
}

impl<P> Envelope<P> {
    pub fn new(operation: impl Into<String>, service_name: impl Into<String>, correlation_id: impl Into<String>, payload: P) -> Self {
        Self {
            operation: operation.into(),
            service_name: service_name.into(),
            timestamp: Utc::now(),
            correlation_id: correlation_id.into(),
            payload,
        }
    }
}

/// Payload of a `process_topic` message (E → F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicMessage {
    pub topic_id: String,
    pub title: String,
    pub source: String,
    pub collected_at: DateTime<Utc>,
    pub priority_score: f64,
    pub collection_id: String,
    pub collection_blob: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boosts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Validate a freshly deserialized [`TopicMessage`] beyond what serde's
/// required-field checking already enforces (§3, §4.F malformed-message
/// handling): `priority_score` must lie in `[0, 1]` and identifiers must be
/// non-empty.
pub fn validate_topic_message(msg: &TopicMessage) -> Result<(), String> {
    if msg.topic_id.trim().is_empty() {
        return Err("topic_id is empty".to_string());
    }
    if msg.collection_id.trim().is_empty() {
        return Err("collection_id is empty".to_string());
    }
    if msg.collection_blob.trim().is_empty() {
        return Err("collection_blob is empty".to_string());
    }
    if !(0.0..=1.0).contains(&msg.priority_score) {
        return Err(format!(
            "priority_score {} out of range [0, 1]",
            msg.priority_score
        ));
    }
    Ok(())
}

/// `{collection_id}_{topic_id}` — the fixed correlation id format (§3, §6).
pub fn correlation_id(collection_id: &str, topic_id: &str) -> String {
    format!("{collection_id}_{topic_id}")
}

/// Payload of a cron wake-up message (J → E): which sources to run this
/// cycle and an optional override of the per-cycle item budget. Both are
/// optional so the orchestrator can send a bare wake-up and let the
/// collector fall back to its configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionWakeup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

/// Payload of a `generate_markdown` message (F → G). References the
/// processed-content blob the renderer must read rather than carrying the
/// article body itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownJob {
    pub article_blob: String,
    pub slug: String,
    pub published_date: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Payload of a `markdown_generated` message (G → H).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishJob {
    pub markdown_blob: String,
    pub slug: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force_rebuild: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TopicMessage {
        TopicMessage {
            topic_id: "abc".into(),
            title: "Understanding Python Async".into(),
            source: "reddit".into(),
            collected_at: Utc::now(),
            priority_score: 0.5,
            collection_id: "col-1".into(),
            collection_blob: "collections/2025/10/08/collection_1.json".into(),
            subreddit: Some("programming".into()),
            url: None,
            upvotes: Some(100),
            comments: None,
            boosts: None,
            author: None,
        }
    }

    #[test]
    fn correlation_id_format() {
        assert_eq!(correlation_id("col-1", "abc"), "col-1_abc");
    }

    #[test]
    fn validate_rejects_out_of_range_priority() {
        let mut msg = sample();
        msg.priority_score = 1.5;
        assert!(validate_topic_message(&msg).is_err());
    }

    #[test]
    fn validate_accepts_well_formed_message() {
        assert!(validate_topic_message(&sample()).is_ok());
    }

    #[test]
    fn envelope_roundtrips_through_json() {
        let env = Envelope::new("process_topic", "gazette-collector", "col-1_abc", sample());
        let json = serde_json::to_string(&env).unwrap();
        let back: Envelope<TopicMessage> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.operation, "process_topic");
        assert_eq!(back.payload.topic_id, "abc");
    }

    #[test]
    fn markdown_job_roundtrips_and_defaults_template_absent() {
        let job = MarkdownJob {
            article_blob: "articles/2025-10-08/test-article.json".into(),
            slug: "test-article".into(),
            published_date: Utc::now(),
            template: None,
        };
        let json = serde_json::to_string(&job).unwrap();
        assert!(!json.contains("template"));
        let back: MarkdownJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back.slug, "test-article");
    }

    #[test]
    fn publish_job_omits_force_rebuild_when_false() {
        let job = PublishJob {
            markdown_blob: "articles/2025-10-08/test-article.md".into(),
            slug: "test-article".into(),
            force_rebuild: false,
        };
        let json = serde_json::to_string(&job).unwrap();
        assert!(!json.contains("force_rebuild"));
    }

    #[test]
    fn unknown_payload_fields_are_tolerated() {
        let raw = serde_json::json!({
            "operation": "process_topic",
            "service_name": "x",
            "timestamp": Utc::now(),
            "correlation_id": "c_1",
            "payload": {
                "topic_id": "1", "title": "t", "source": "reddit",
                "collected_at": Utc::now(), "priority_score": 0.5,
                "collection_id": "c", "collection_blob": "b",
                "some_future_field": "ignored",
            }
        });
        let env: Envelope<TopicMessage> = serde_json::from_value(raw).unwrap();
        assert_eq!(env.payload.topic_id, "1");
    }
}
