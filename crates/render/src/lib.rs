//! Markdown renderer (§4.G): a pure function from processed-article JSON
//! plus a template name to a [`MarkdownArtifact`]. No I/O happens in this
//! crate's library surface — the binary owns fetching the article blob,
//! writing the rendered markdown, and enqueuing the publish job.

pub mod front_matter;
pub mod templates;
pub mod title;

use chrono::Utc;
use thiserror::Error;

use gazette_core::article::MarkdownArtifact;
use gazette_core::seo::{generate_article_url, markdown_path, parse_flexible_timestamp};

use front_matter::{build_front_matter, front_matter_yaml, FrontMatterInput};
pub use templates::TemplateKind;
use templates::{render_body, TemplateError};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unparseable published_date `{0}`")]
    BadTimestamp(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("yaml front-matter error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Renders one processed-article JSON document into a [`MarkdownArtifact`].
///
/// `content` is read from the `content` field, falling back to
/// `article_content` if present; when neither is present only front-matter
/// is written and the body is empty (§4.G).
pub fn render_markdown(raw: &serde_json::Value, template: TemplateKind) -> Result<MarkdownArtifact, RenderError> {
    let raw_title = raw.get("title").and_then(|v| v.as_str()).ok_or(RenderError::MissingField("title"))?;
    let slug = raw.get("slug").and_then(|v| v.as_str()).ok_or(RenderError::MissingField("slug"))?;

    let published_date = match raw.get("published_date").and_then(|v| v.as_str()) {
        Some(s) => parse_flexible_timestamp(s).ok_or_else(|| RenderError::BadTimestamp(s.to_string()))?,
        None => Utc::now(),
    };

    let source = raw
        .get("source_metadata")
        .and_then(|sm| sm.get("source"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let author = raw.get("source_metadata").and_then(|sm| sm.get("author")).and_then(|v| v.as_str());

    let tags = raw
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|t| t.as_str().map(str::to_string)).collect::<Vec<_>>());
    let category = raw.get("category").and_then(|v| v.as_str());
    let hero_image = raw.get("hero_image").and_then(|v| v.as_str());
    let image_alt = raw.get("image_alt").and_then(|v| v.as_str());
    let image_credit = raw.get("image_credit").and_then(|v| v.as_str());

    let clean_title = title::clean_title(raw_title);
    let url = generate_article_url(published_date, slug);

    let front_matter = build_front_matter(FrontMatterInput {
        title: clean_title.clone(),
        url,
        source: source.to_string(),
        date: published_date,
        author,
        tags,
        category,
        hero_image,
        image_alt,
        image_credit,
    });
    let front_matter_yaml = front_matter_yaml(&front_matter)?;

    let content = raw
        .get("content")
        .and_then(|v| v.as_str())
        .or_else(|| raw.get("article_content").and_then(|v| v.as_str()));

    let body = match content {
        Some(c) if !c.trim().is_empty() => render_body(template, &clean_title, c)?,
        _ => String::new(),
    };

    Ok(MarkdownArtifact {
        path: markdown_path(published_date, slug),
        front_matter_yaml,
        body,
    })
}
