//! SEO metadata derivation — pure functions, no I/O: slug, SEO title,
//! article id, URL path, and filename, all derived the same way from a
//! title and a publication date.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn non_word_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").unwrap())
}

fn space_or_hyphen_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-\s]+").unwrap())
}

/// URL-safe slug: lowercase, hyphen-separated, `[a-z0-9-]` only, never
/// starting or ending with `-`. Idempotent: `slugify(slugify(s)) == slugify(s)`.
pub fn generate_slug(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let lower = title.to_lowercase();
    let no_quotes: String = lower
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '`' | '"'))
        .collect();
    let no_special = non_word_run().replace_all(&no_quotes, "");
    let hyphenated = space_or_hyphen_run().replace_all(&no_special, "-");
    hyphenated.trim_matches('-').to_string()
}

/// Truncate to at most `max_length` characters, adding an ellipsis when
/// truncated. Returns the input unchanged when it already fits.
pub fn generate_seo_title(title: &str, max_length: usize) -> String {
    if title.is_empty() {
        return String::new();
    }
    if title.chars().count() <= max_length {
        return title.to_string();
    }

    let keep = max_length.saturating_sub(3);
    let truncated: String = title.chars().take(keep).collect();
    format!("{}...", truncated.trim_end())
}

/// `YYYYMMDD-slug.extension`.
pub fn generate_filename(date: DateTime<Utc>, slug: &str, extension: &str) -> String {
    format!("{}-{}.{}", date.format("%Y%m%d"), slug, extension)
}

/// `/YYYY/MM/slug`.
pub fn generate_article_url(date: DateTime<Utc>, slug: &str) -> String {
    format!("/{}/{:02}/{}", date.format("%Y"), date.format("%m"), slug)
}

/// `YYYYMMDD-slug`.
pub fn generate_article_id(date: DateTime<Utc>, slug: &str) -> String {
    format!("{}-{}", date.format("%Y%m%d"), slug)
}

/// `articles/YYYY-MM-DD` — the shared directory prefix used by both the
/// processed-content (`.json`) and markdown-content (`.md`) paths.
pub fn article_dir_prefix(date: DateTime<Utc>) -> String {
    format!("articles/{}", date.format("%Y-%m-%d"))
}

/// Accepts any ISO-8601 timestamp whether or not it carries a timezone
/// offset or fractional seconds (§6): tries RFC 3339 first (the common
/// case, e.g. `2025-10-08T12:00:00Z` or `...12:00:00.123+02:00`), then
/// falls back to a bare `YYYY-MM-DDTHH:MM:SS[.fff]` treated as UTC.
pub fn parse_flexible_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }
    None
}

pub fn processed_path(date: DateTime<Utc>, slug: &str) -> String {
    format!("{}/{}.json", article_dir_prefix(date), slug)
}

pub fn markdown_path(date: DateTime<Utc>, slug: &str) -> String {
    format!("{}/{}.md", article_dir_prefix(date), slug)
}

/// All SEO-derived fields for a title published at a given instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SeoMetadata {
    pub slug: String,
    pub seo_title: String,
    pub filename: String,
    pub url: String,
    pub article_id: String,
}

/// Returns `None` when the title slugifies to an empty string (defensive —
/// callers should treat this as a validation failure upstream).
pub fn create_seo_metadata(title: &str, date: DateTime<Utc>) -> Option<SeoMetadata> {
    let slug = generate_slug(title);
    if slug.is_empty() {
        return None;
    }
    Some(SeoMetadata {
        seo_title: generate_seo_title(title, 60),
        filename: generate_filename(date, &slug, "md"),
        url: generate_article_url(date, &slug),
        article_id: generate_article_id(date, &slug),
        slug,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn slug_basic() {
        assert_eq!(
            generate_slug("How AI is Transforming Development"),
            "how-ai-is-transforming-development"
        );
    }

    #[test]
    fn slug_strips_punctuation_and_apostrophes() {
        assert_eq!(generate_slug("What's New in AI?"), "whats-new-in-ai");
        assert_eq!(generate_slug("Python 3.12 Released!"), "python-312-released");
    }

    #[test]
    fn slug_is_idempotent() {
        let s = generate_slug("Hello, World! -- Again");
        assert_eq!(generate_slug(&s), s);
    }

    #[test]
    fn slug_never_has_leading_or_trailing_hyphen() {
        let s = generate_slug("-- weird title --");
        assert!(!s.starts_with('-') && !s.ends_with('-'));
    }

    #[test]
    fn slug_only_contains_allowed_chars() {
        let s = generate_slug("C++ & Rust: A Love/Hate Story #42");
        assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn seo_title_unchanged_under_limit() {
        assert_eq!(generate_seo_title("Short Title", 60), "Short Title");
    }

    #[test]
    fn seo_title_truncates_with_ellipsis() {
        let long = "a".repeat(100);
        let seo = generate_seo_title(&long, 60);
        assert_eq!(seo.chars().count(), 60);
        assert!(seo.ends_with("..."));
    }

    #[test]
    fn processed_and_markdown_paths_share_prefix() {
        let d = dt(2025, 10, 8);
        let p = processed_path(d, "test-article");
        let m = markdown_path(d, "test-article");
        assert_eq!(p, "articles/2025-10-08/test-article.json");
        assert_eq!(m, "articles/2025-10-08/test-article.md");
    }

    #[test]
    fn create_seo_metadata_matches_reference_values() {
        let d = dt(2025, 10, 8);
        let meta = create_seo_metadata("Test Article", d).unwrap();
        assert_eq!(meta.slug, "test-article");
        assert_eq!(meta.article_id, "20251008-test-article");
        assert_eq!(meta.url, "/2025/10/test-article");
        assert_eq!(meta.filename, "20251008-test-article.md");
    }

    #[test]
    fn empty_title_yields_no_metadata() {
        assert!(create_seo_metadata("???", Utc::now()).is_none());
    }

    #[test]
    fn parses_rfc3339_with_and_without_fractional_seconds() {
        assert!(parse_flexible_timestamp("2025-10-08T12:00:00Z").is_some());
        assert!(parse_flexible_timestamp("2025-10-08T12:00:00.123Z").is_some());
        assert!(parse_flexible_timestamp("2025-10-08T12:00:00+02:00").is_some());
    }

    #[test]
    fn parses_bare_timestamp_without_offset_as_utc() {
        let dt = parse_flexible_timestamp("2025-10-08T12:00:00").unwrap();
        assert_eq!(dt, dt_with_prefix());

        fn dt_with_prefix() -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2025, 10, 8, 12, 0, 0).unwrap()
        }
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(parse_flexible_timestamp("not a date").is_none());
    }
}
