//! Per-item quality gate (§4.C): three sequential pure filters, each
//! returning `(accepted, reason)` rather than raising.

use gazette_core::StandardItem;

const TECH_KEYWORDS: &[&str] = &[
    "code", "software", "develop", "program", "tech", "data", "api", "database", "server",
    "security", "python", "javascript", "cloud", "algorithm", "network", "system", "app", "tool",
    "framework",
];

const OFF_TOPIC_SOURCES: &[&str] = &[
    "funny", "videos", "nosleep", "relationship_advice", "amitheasshole", "tifu",
    "showerthoughts",
];

/// Stage 1: required fields present and well-typed. [`StandardItem`] is
/// already typed by construction, so this only checks the semantic
/// constraints serde cannot: non-empty required strings.
pub fn validate_item(item: &StandardItem) -> Result<(), &'static str> {
    if item.id.trim().is_empty() {
        return Err("validation_error: missing id");
    }
    if item.title.trim().is_empty() {
        return Err("validation_error: missing title");
    }
    if item.content.trim().is_empty() {
        return Err("validation_error: missing content");
    }
    Ok(())
}

/// Stage 2: readability — title/content length, alphanumeric ratio,
/// markup-dominance.
pub fn check_readability(item: &StandardItem) -> Result<(), &'static str> {
    let title = item.title.trim();
    let content = item.content.trim();

    if title.chars().count() < 10 {
        return Err("title_too_short");
    }
    if content.chars().count() < 100 {
        return Err("content_too_short");
    }

    let alnum_or_space = title.chars().filter(|c| c.is_alphanumeric() || c.is_whitespace()).count();
    if (alnum_or_space as f64) < title.chars().count() as f64 * 0.5 {
        return Err("title_not_readable");
    }

    let markup_chars = content.matches('<').count() + content.matches('{').count();
    let ratio = markup_chars as f64 / content.chars().count().max(1) as f64;
    if ratio > 0.15 {
        return Err("content_mostly_markup");
    }

    Ok(())
}

/// Stage 3 (only under `strict_mode`): topical relevance.
pub fn check_technical_relevance(item: &StandardItem) -> Result<(), &'static str> {
    let combined = format!("{} {}", item.title.to_lowercase(), item.content.to_lowercase());
    let has_keyword = TECH_KEYWORDS.iter().any(|kw| combined.contains(kw));
    if !has_keyword {
        return Err("no_technical_keywords");
    }

    if let Some(subreddit) = item.subreddit() {
        if OFF_TOPIC_SOURCES.contains(&subreddit.to_lowercase().as_str()) {
            return Err("off_topic_source");
        }
    }

    Ok(())
}

/// Run all three filters in order. Returns `(accepted, rejection_reason)`.
pub fn review(item: &StandardItem, strict_mode: bool) -> (bool, Option<String>) {
    if let Err(reason) = validate_item(item) {
        return (false, Some(reason.to_string()));
    }
    if let Err(reason) = check_readability(item) {
        return (false, Some(reason.to_string()));
    }
    if strict_mode {
        if let Err(reason) = check_technical_relevance(item) {
            return (false, Some(reason.to_string()));
        }
    }
    (true, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gazette_core::Source;
    use std::collections::HashMap;

    fn item(title: &str, content: &str) -> StandardItem {
        StandardItem {
            id: "abc".into(),
            title: title.into(),
            content: content.into(),
            source: Source::Reddit,
            url: None,
            collected_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn happy_path_passes() {
        let it = item(
            "Understanding Python Async/Await",
            "Python's async/await is a powerful tool for writing concurrent code in modern applications and APIs.",
        );
        let (ok, reason) = review(&it, true);
        assert!(ok, "{reason:?}");
    }

    #[test]
    fn rejects_short_title() {
        let it = item("Hi", "Short content padded to be long enough but the title is still too short here");
        let (ok, reason) = review(&it, true);
        assert!(!ok);
        assert_eq!(reason.as_deref(), Some("title_too_short"));
    }

    #[test]
    fn rejects_short_content() {
        let it = item("A reasonably long title here", "Short");
        let (ok, reason) = review(&it, true);
        assert!(!ok);
        assert_eq!(reason.as_deref(), Some("content_too_short"));
    }

    #[test]
    fn rejects_markup_dominant_content() {
        let markup = "<div>{\"a\":1}</div>".repeat(20);
        let it = item("A perfectly fine readable title", &markup);
        let (ok, reason) = review(&it, false);
        assert!(!ok);
        assert_eq!(reason.as_deref(), Some("content_mostly_markup"));
    }

    #[test]
    fn rejects_non_technical_content_in_strict_mode() {
        let it = item(
            "A Lovely Day at the Park",
            "We went for a walk and had a picnic and enjoyed the sunshine all afternoon together.",
        );
        let (ok, reason) = review(&it, true);
        assert!(!ok);
        assert_eq!(reason.as_deref(), Some("no_technical_keywords"));
    }

    #[test]
    fn permissive_mode_skips_relevance_check() {
        let it = item(
            "A Lovely Day at the Park",
            "We went for a walk and had a picnic and enjoyed the sunshine all afternoon together.",
        );
        let (ok, _) = review(&it, false);
        assert!(ok);
    }

    #[test]
    fn rejects_off_topic_subreddit() {
        let mut it = item(
            "Some software development discussion thread",
            "This is a sufficiently long piece of content about programming and APIs and so on here.",
        );
        it.metadata.insert("subreddit".into(), gazette_core::MetaValue::Text("funny".into()));
        let (ok, reason) = review(&it, true);
        assert!(!ok);
        assert_eq!(reason.as_deref(), Some("off_topic_source"));
    }
}
