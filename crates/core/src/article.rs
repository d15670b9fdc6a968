//! Article and markdown artifact shapes (§3), written once per path and
//! never updated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Written by the topic processor at `articles/YYYY-MM-DD/{slug}.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleArtifact {
    pub title: String,
    pub slug: String,
    pub seo_title: String,
    pub published_date: DateTime<Utc>,
    pub content: String,
    pub source_metadata: SourceMetadata,
    pub cost: f64,
    pub quality_score: f64,
    pub word_count: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_credit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ArticleArtifact {
    /// Word count of `content`, used to cross-check `word_count` in tests.
    pub fn counted_words(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Written by the renderer at `articles/YYYY-MM-DD/{slug}.md`; same logical
/// content as [`ArticleArtifact`] but expressed as a rendered Markdown
/// document (YAML front-matter + body).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownArtifact {
    pub path: String,
    pub front_matter_yaml: String,
    pub body: String,
}

impl MarkdownArtifact {
    pub fn rendered(&self) -> String {
        format!("---\n{}---\n\n{}\n", self.front_matter_yaml, self.body)
    }
}
