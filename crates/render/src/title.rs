//! Title cleaner (§4.G): strips inline URLs and trailing ellipses before a
//! title is written into front-matter or a heading.

use std::sync::OnceLock;

use regex::Regex;

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").unwrap())
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Removes inline `http(s)://` links, collapses the resulting whitespace,
/// and trims a trailing ellipsis (`"..."` or the single-character `"…"`).
pub fn clean_title(title: &str) -> String {
    let without_urls = url_pattern().replace_all(title, "");
    let collapsed = whitespace_run().replace_all(without_urls.trim(), " ");
    let mut cleaned = collapsed.trim().to_string();

    while cleaned.ends_with('…') || cleaned.ends_with("...") {
        cleaned = cleaned.trim_end_matches('…').trim_end_matches("...").trim_end().to_string();
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_inline_url() {
        assert_eq!(clean_title("Great article https://example.com/post see here"), "Great article see here");
    }

    #[test]
    fn strips_trailing_ellipsis() {
        assert_eq!(clean_title("Breaking news..."), "Breaking news");
        assert_eq!(clean_title("Breaking news…"), "Breaking news");
    }

    #[test]
    fn strips_repeated_trailing_ellipsis() {
        assert_eq!(clean_title("Wow what a story.......…"), "Wow what a story");
    }

    #[test]
    fn leaves_plain_title_untouched() {
        assert_eq!(clean_title("How AI is Transforming Development"), "How AI is Transforming Development");
    }

    #[test]
    fn collapses_whitespace_left_by_removed_url() {
        let cleaned = clean_title("Check   this https://example.com/x   out");
        assert!(!cleaned.contains("  "));
    }
}
