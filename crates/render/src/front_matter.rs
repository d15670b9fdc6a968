//! YAML front-matter builder (§4.G). Takes the renderer's already-cleaned
//! title plus the loosely-typed processed-article JSON and emits the
//! dictionary Hugo expects at the top of each markdown file.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Cover {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrontMatter {
    pub title: String,
    pub url: String,
    pub source: String,
    pub date: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<Cover>,
}

/// Inputs pulled out of the processed-content JSON by the caller, already
/// cleaned (`title`) and derived (`url`) where applicable.
pub struct FrontMatterInput<'a> {
    pub title: String,
    pub url: String,
    pub source: String,
    pub date: DateTime<Utc>,
    pub author: Option<&'a str>,
    pub tags: Option<Vec<String>>,
    pub category: Option<&'a str>,
    pub hero_image: Option<&'a str>,
    pub image_alt: Option<&'a str>,
    pub image_credit: Option<&'a str>,
}

/// `cover` only appears when `hero_image` is present (§4.G); absent
/// `hero_image` means no cover block at all, not one with empty fields.
pub fn build_front_matter(input: FrontMatterInput<'_>) -> FrontMatter {
    let cover = input.hero_image.map(|image| Cover {
        image: image.to_string(),
        alt: input.image_alt.map(|s| s.to_string()),
        caption: input.image_credit.map(|s| s.to_string()),
    });

    FrontMatter {
        title: input.title,
        url: input.url,
        source: input.source,
        date: input.date,
        author: input.author.map(|s| s.to_string()),
        tags: input.tags,
        category: input.category.map(|s| s.to_string()),
        cover,
    }
}

pub fn front_matter_yaml(fm: &FrontMatter) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(fm)
}
