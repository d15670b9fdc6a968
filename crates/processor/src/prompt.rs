//! Prompt construction from topic metadata (§4.F step 3).

use gazette_core::message::TopicMessage;
use gazette_llm::{Message, Role};

const SYSTEM_PROMPT: &str = "You are an expert content writer specializing in technology and software development. \
Write clear, accurate, well-structured articles in Markdown. Never fabricate sources or quotes.";

pub fn build_messages(topic: &TopicMessage) -> Vec<Message> {
    let mut user = format!(
        "Write a complete article based on the following source material.\n\nTitle: {}\nSource: {}\n",
        topic.title, topic.source
    );
    if let Some(subreddit) = &topic.subreddit {
        user.push_str(&format!("Subreddit: r/{subreddit}\n"));
    }
    if let Some(url) = &topic.url {
        user.push_str(&format!("Source URL: {url}\n"));
    }
    if let Some(author) = &topic.author {
        user.push_str(&format!("Original author: {author}\n"));
    }
    user.push_str(
        "\nProduce a full article with a clear introduction, body, and conclusion. \
Do not include a title heading; start directly with the body text.",
    );

    vec![
        Message { role: Role::System, content: SYSTEM_PROMPT.to_string() },
        Message { role: Role::User, content: user },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn topic() -> TopicMessage {
        TopicMessage {
            topic_id: "t1".into(),
            title: "Understanding Rust Lifetimes".into(),
            source: "reddit".into(),
            collected_at: Utc::now(),
            priority_score: 0.7,
            collection_id: "col-1".into(),
            collection_blob: "collections/2025/10/08/col-1.json".into(),
            subreddit: Some("rust".into()),
            url: Some("https://reddit.com/r/rust/abc".into()),
            upvotes: Some(500),
            comments: Some(42),
            boosts: None,
            author: Some("someone".into()),
        }
    }

    #[test]
    fn includes_title_and_optional_fields() {
        let messages = build_messages(&topic());
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0].role, Role::System));
        assert!(messages[1].content.contains("Understanding Rust Lifetimes"));
        assert!(messages[1].content.contains("r/rust"));
        assert!(messages[1].content.contains("someone"));
    }

    #[test]
    fn omits_absent_optional_fields() {
        let mut t = topic();
        t.subreddit = None;
        t.author = None;
        let messages = build_messages(&t);
        assert!(!messages[1].content.contains("Subreddit"));
        assert!(!messages[1].content.contains("Original author"));
    }
}
