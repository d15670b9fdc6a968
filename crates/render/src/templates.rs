//! Body template selection and rendering.
//!
//! Grounded on the templating pattern used elsewhere in this workspace for
//! user-supplied template strings: a fresh `minijinja::Environment` is built
//! per render call (templates here are small embedded strings, not files
//! registered once), with a couple of filters registered the same way.

use std::fmt;
use std::str::FromStr;

use minijinja::{context, Environment};
use thiserror::Error;

use gazette_core::seo::generate_slug;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template render failed: {0}")]
    Render(#[from] minijinja::Error),
    #[error("unknown template `{0}`, expected one of default|minimal|with-toc")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Default,
    Minimal,
    WithToc,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Default => "default",
            TemplateKind::Minimal => "minimal",
            TemplateKind::WithToc => "with-toc",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            TemplateKind::Default => "# {{ title }}\n\n{{ content }}\n",
            TemplateKind::Minimal => "{{ content }}\n",
            TemplateKind::WithToc => "# {{ title }}\n\n{% if toc %}{{ toc }}\n\n{% endif %}{{ content }}\n",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" | "" => Ok(TemplateKind::Default),
            "minimal" => Ok(TemplateKind::Minimal),
            "with-toc" | "with_toc" => Ok(TemplateKind::WithToc),
            other => Err(TemplateError::Unknown(other.to_string())),
        }
    }
}

/// Builds a markdown table of contents from `##`/`###` headings found in
/// `content`; empty when there are none, so `with-toc` degrades to `default`.
fn build_toc(content: &str) -> String {
    let mut toc = String::new();
    for line in content.lines() {
        let trimmed = line.trim_start();
        if let Some(heading) = trimmed.strip_prefix("### ") {
            toc.push_str(&format!("  - [{heading}](#{})\n", generate_slug(heading)));
        } else if let Some(heading) = trimmed.strip_prefix("## ") {
            toc.push_str(&format!("- [{heading}](#{})\n", generate_slug(heading)));
        }
    }
    toc.trim_end().to_string()
}

/// Renders the article body for the given template, given the already
/// title-cleaned heading and the raw markdown content.
pub fn render_body(kind: TemplateKind, title: &str, content: &str) -> Result<String, TemplateError> {
    let mut env = Environment::new();
    env.add_filter("lower", |s: String| s.to_lowercase());
    env.add_filter("upper", |s: String| s.to_uppercase());

    let toc = if matches!(kind, TemplateKind::WithToc) { build_toc(content) } else { String::new() };

    let rendered = env.render_str(kind.source(), context! { title, content, toc })?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_has_heading() {
        let body = render_body(TemplateKind::Default, "My Title", "Some body text.").unwrap();
        assert!(body.starts_with("# My Title"));
        assert!(body.contains("Some body text."));
    }

    #[test]
    fn minimal_template_omits_heading() {
        let body = render_body(TemplateKind::Minimal, "My Title", "Some body text.").unwrap();
        assert!(!body.contains("My Title"));
        assert_eq!(body.trim(), "Some body text.");
    }

    #[test]
    fn with_toc_includes_headings() {
        let content = "## First Section\n\nIntro.\n\n## Second Section\n\nMore.\n";
        let body = render_body(TemplateKind::WithToc, "Title", content).unwrap();
        assert!(body.contains("[First Section](#first-section)"));
        assert!(body.contains("[Second Section](#second-section)"));
    }

    #[test]
    fn with_toc_degrades_gracefully_without_headings() {
        let body = render_body(TemplateKind::WithToc, "Title", "No headings here.").unwrap();
        assert!(body.contains("No headings here."));
    }

    #[test]
    fn parses_template_names() {
        assert_eq!(TemplateKind::from_str("default").unwrap(), TemplateKind::Default);
        assert_eq!(TemplateKind::from_str("minimal").unwrap(), TemplateKind::Minimal);
        assert_eq!(TemplateKind::from_str("with-toc").unwrap(), TemplateKind::WithToc);
        assert!(TemplateKind::from_str("bogus").is_err());
    }
}
