//! Optional scoring signals layered on top of [`crate::review`] (§4.C):
//! paywall, comparison/listicle, and length detectors, combined into a
//! single quality score.
//!
//! The concrete domain/keyword/regex lists are this implementation's fixed
//! choice (SPEC_FULL.md §4.C records the decision) — the reference
//! implementation names these only by example.

use regex::Regex;
use std::sync::OnceLock;

const PAYWALL_DOMAINS: &[&str] = &[
    "wsj.com",
    "nytimes.com",
    "ft.com",
    "economist.com",
    "bloomberg.com",
    "washingtonpost.com",
    "newyorker.com",
];

const PAYWALL_KEYWORDS: &[&str] = &[
    "subscribe to continue",
    "subscription required",
    "paywall",
    "become a member to read",
];

fn comparison_regexes() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r"(?i)\b\d+\s+(best|top|worst)\b").unwrap(),
            Regex::new(r"(?i)\bvs\.?\b").unwrap(),
            Regex::new(r"(?i)\bversus\b").unwrap(),
        ]
    })
}

fn listicle_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*\d+\s+(ways|reasons|things|tips|tricks)\b").unwrap())
}

/// Domain-or-keyword paywall check against `url` and `content`.
pub fn is_paywalled(url: Option<&str>, content: &str) -> bool {
    if let Some(url) = url {
        let lower = url.to_lowercase();
        if PAYWALL_DOMAINS.iter().any(|d| lower.contains(d)) {
            return true;
        }
    }
    let lower_content = content.to_lowercase();
    PAYWALL_KEYWORDS.iter().any(|kw| lower_content.contains(kw))
}

pub fn is_comparison(title: &str) -> bool {
    comparison_regexes().iter().any(|re| re.is_match(title))
}

pub fn is_listicle(title: &str) -> bool {
    listicle_regex().is_match(title)
}

/// Length score component: penalize content well outside a comfortable
/// band, reward content squarely inside it.
fn length_adjustment(word_count: usize) -> f64 {
    match word_count {
        150..=2000 => 0.10,
        _ => -0.10,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub paywall_penalty: f64,
    pub comparison_penalty: f64,
    pub listicle_penalty: f64,
    pub length_adjustment: f64,
    pub total: f64,
}

/// Start at 1.0 and apply fixed penalties/bonuses (§4.C). Clamped to
/// `[0, 1]`.
pub fn score_item(title: &str, content: &str, url: Option<&str>) -> ScoreBreakdown {
    let paywall_penalty = if is_paywalled(url, content) { -0.40 } else { 0.0 };
    let comparison_penalty = if is_comparison(title) { -0.25 } else { 0.0 };
    let listicle_penalty = if is_listicle(title) { -0.20 } else { 0.0 };
    let word_count = content.split_whitespace().count();
    let length_adjustment = length_adjustment(word_count);

    let total = (1.0 + paywall_penalty + comparison_penalty + listicle_penalty + length_adjustment)
        .clamp(0.0, 1.0);

    ScoreBreakdown {
        base: 1.0,
        paywall_penalty,
        comparison_penalty,
        listicle_penalty,
        length_adjustment,
        total,
    }
}

/// Cap the number of items kept per source to `cap`, preserving relative
/// order and preferring higher-scored items for a given source when more
/// than `cap` are present.
pub fn apply_diversity_cap<T: Clone>(items: Vec<(T, String, f64)>, cap: usize) -> Vec<T> {
    use std::collections::HashMap;

    let mut by_source: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, (_, source, _)) in items.iter().enumerate() {
        by_source.entry(source.clone()).or_default().push(i);
    }

    let mut keep = vec![false; items.len()];
    for (_, indices) in by_source {
        let mut sorted = indices;
        sorted.sort_by(|&a, &b| items[b].2.partial_cmp(&items[a].2).unwrap());
        for &i in sorted.iter().take(cap) {
            keep[i] = true;
        }
    }

    items
        .into_iter()
        .zip(keep)
        .filter(|(_, k)| *k)
        .map(|((item, _, _), _)| item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paywall_domain_detected() {
        assert!(is_paywalled(Some("https://www.wsj.com/articles/x"), "benign content"));
    }

    #[test]
    fn paywall_keyword_detected_without_domain() {
        assert!(is_paywalled(None, "Please subscribe to continue reading this story."));
    }

    #[test]
    fn benign_content_not_paywalled() {
        assert!(!is_paywalled(Some("https://blog.example.com/post"), "just a regular post"));
    }

    #[test]
    fn comparison_title_detected() {
        assert!(is_comparison("Rust vs Go: a performance comparison"));
        assert!(is_comparison("10 Best programming languages"));
    }

    #[test]
    fn listicle_title_detected() {
        assert!(is_listicle("7 ways to improve your code"));
        assert!(!is_listicle("An article about 7 ways code improves"));
    }

    #[test]
    fn paywall_rejection_drops_score_below_threshold() {
        let score = score_item(
            "A Deep Dive Into Something",
            &"word ".repeat(300),
            Some("https://www.wsj.com/story"),
        );
        assert!((score.paywall_penalty - (-0.40)).abs() < f64::EPSILON);
        assert!(score.total < 0.60);
    }

    #[test]
    fn score_never_below_zero_or_above_one() {
        let score = score_item("10 Best vs Worst Things", "short", None);
        assert!(score.total >= 0.0 && score.total <= 1.0);
    }

    #[test]
    fn diversity_cap_limits_per_source() {
        let items: Vec<(&str, String, f64)> = vec![
            ("a", "reddit".into(), 0.9),
            ("b", "reddit".into(), 0.8),
            ("c", "reddit".into(), 0.7),
            ("d", "reddit".into(), 0.6),
            ("e", "rss".into(), 0.5),
        ];
        let kept = apply_diversity_cap(items, 3);
        assert_eq!(kept.len(), 4);
        assert!(!kept.contains(&"d"));
        assert!(kept.contains(&"e"));
    }
}
