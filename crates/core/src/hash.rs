use sha2::{Digest, Sha256};

/// SHA-256 over `trim(title) || first_500_chars(trim(content))` (§3
/// ContentHash). Returns `""` for inputs that can't reasonably be hashed —
/// downstream dedup layers treat the empty string as "never matches".
pub fn hash_content(title: &str, content: &str) -> String {
    let title = title.trim();
    let content = content.trim();

    if title.is_empty() && content.is_empty() {
        return String::new();
    }

    let truncated_content: String = content.chars().take(500).collect();

    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(truncated_content.as_bytes());
    let digest = hasher.finalize();

    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        let a = hash_content("Title", "Some content here");
        let b = hash_content("Title", "Some content here");
        assert_eq!(a, b);
    }

    #[test]
    fn is_64_lowercase_hex_chars() {
        let h = hash_content("Title", "Some content here");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn empty_input_yields_empty_hash() {
        assert_eq!(hash_content("", ""), "");
    }

    #[test]
    fn differs_on_content_change() {
        let a = hash_content("Title", "Content A");
        let b = hash_content("Title", "Content B");
        assert_ne!(a, b);
    }

    #[test]
    fn truncates_content_at_500_chars() {
        let long = "x".repeat(1000);
        let a = hash_content("Title", &long);
        let mut shorter = "x".repeat(500);
        shorter.push_str(&"y".repeat(500));
        let b = hash_content("Title", &shorter);
        assert_eq!(a, b, "only the first 500 chars should affect the hash");
    }

    #[test]
    fn whitespace_is_trimmed_before_hashing() {
        let a = hash_content("  Title  ", "  content  ");
        let b = hash_content("Title", "content");
        assert_eq!(a, b);
    }
}
