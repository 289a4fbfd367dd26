//! Article records and the article form.
//!
//! `Article` is the persisted row. `ArticleForm` is what the backoffice edits:
//! the same metadata plus the decoded structured content and the two derived
//! HTML values, which are regenerated on every save.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::content::{DocumentMeta, SeoInput, StructuredContent, decode_content};
use crate::error::ValidationErrors;

#[allow(clippy::expect_used)]
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Publication status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Error for status names outside draft, published and archived.
#[derive(Debug, Error)]
#[error("unknown article status '{0}'")]
pub struct UnknownStatus(pub String);

impl ArticleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
            ArticleStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ArticleStatus::Draft),
            "published" => Ok(ArticleStatus::Published),
            "archived" => Ok(ArticleStatus::Archived),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Persisted article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub author: String,
    pub author_link: String,
    pub publish_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: ArticleStatus,
    pub main_image_url: String,
    pub main_image_alt: String,
    pub main_image_caption: String,
    pub intro_text: String,
    /// Structured content JSON, or legacy HTML for older rows.
    pub content: String,
    /// Standalone HTML document rendered at save time.
    pub generated_html: String,
    pub created_by: Option<Uuid>,
    pub created: DateTime<Utc>,
    pub changed: DateTime<Utc>,
}

/// List projection of an article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub author: String,
    pub status: ArticleStatus,
    pub publish_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub changed: DateTime<Utc>,
}

/// Editable article values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleForm {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub author: String,
    pub author_link: String,
    pub publish_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: ArticleStatus,
    pub main_image_url: String,
    pub main_image_alt: String,
    pub main_image_caption: String,
    pub intro_text: String,
    pub structured_content: StructuredContent,
    /// Fragment HTML derived from `structured_content`.
    #[serde(skip_deserializing)]
    pub content: String,
    /// Document HTML derived from the form.
    #[serde(skip_deserializing)]
    pub generated_html: String,
}

impl Article {
    /// Build a record from a form whose derived values are already filled.
    pub fn from_form(id: Uuid, form: ArticleForm, content_json: String, created_by: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: form.title.trim().to_string(),
            slug: form.slug,
            excerpt: form.excerpt,
            author: form.author,
            author_link: form.author_link,
            publish_date: form.publish_date,
            category: form.category.filter(|c| !c.trim().is_empty()),
            tags: form.tags,
            status: form.status,
            main_image_url: form.main_image_url,
            main_image_alt: form.main_image_alt,
            main_image_caption: form.main_image_caption,
            intro_text: form.intro_text,
            content: content_json,
            generated_html: form.generated_html,
            created_by,
            created: now,
            changed: now,
        }
    }

    /// Decode the persisted content, importing legacy HTML when needed.
    pub fn structured_content(&self) -> StructuredContent {
        decode_content(&self.content).into_structured()
    }

    /// The editable form for this article.
    pub fn to_form(&self) -> ArticleForm {
        let structured_content = self.structured_content();
        ArticleForm {
            title: self.title.clone(),
            slug: self.slug.clone(),
            excerpt: self.excerpt.clone(),
            author: self.author.clone(),
            author_link: self.author_link.clone(),
            publish_date: self.publish_date,
            category: self.category.clone(),
            tags: self.tags.clone(),
            status: self.status,
            main_image_url: self.main_image_url.clone(),
            main_image_alt: self.main_image_alt.clone(),
            main_image_caption: self.main_image_caption.clone(),
            intro_text: self.intro_text.clone(),
            content: crate::content::render_fragment(&structured_content),
            generated_html: self.generated_html.clone(),
            structured_content,
        }
    }

    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
            excerpt: self.excerpt.clone(),
            author: self.author.clone(),
            status: self.status,
            publish_date: self.publish_date,
            category: self.category.clone(),
            changed: self.changed,
        }
    }
}

impl ArticleForm {
    /// Derive the slug from the title when none was given.
    pub fn fill_slug(&mut self) {
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.title);
        }
    }

    /// Check the form and collect one message per invalid field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Title is required");
        } else if title.chars().count() > MAX_TITLE_LENGTH {
            errors.add(
                "title",
                format!("Title must be at most {MAX_TITLE_LENGTH} characters"),
            );
        }

        if self.slug.is_empty() {
            errors.add("slug", "Slug is required");
        } else if !SLUG_RE.is_match(&self.slug) {
            errors.add(
                "slug",
                "Slug may only contain lowercase letters, digits and single hyphens",
            );
        }

        if !is_blank_or_http_url(&self.author_link) {
            errors.add("author_link", "Author link must be an http(s) URL");
        }

        if !is_blank_or_http_url(&self.main_image_url) {
            errors.add("main_image_url", "Main image URL must be an http(s) URL");
        }

        errors.into_result()
    }

    /// Values the SEO score is computed from. `html` is the exported fragment.
    pub fn seo_input<'a>(&'a self, html: &'a str) -> SeoInput<'a> {
        SeoInput {
            title: &self.title,
            excerpt: &self.excerpt,
            content: html,
            slug: &self.slug,
            author: &self.author,
            intro_text: &self.intro_text,
            main_image_url: &self.main_image_url,
            main_image_alt: &self.main_image_alt,
            html,
        }
    }
}

impl DocumentMeta {
    /// Document metadata for an article form.
    pub fn from_form(form: &ArticleForm) -> Self {
        Self {
            title: form.title.trim().to_string(),
            description: form.excerpt.trim().to_string(),
            author: form.author.trim().to_string(),
            author_link: form.author_link.trim().to_string(),
            publish_date: form
                .publish_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            main_image_url: form.main_image_url.trim().to_string(),
            main_image_alt: form.main_image_alt.clone(),
            main_image_caption: form.main_image_caption.clone(),
            intro_text: form.intro_text.clone(),
            ..Self::default()
        }
    }
}

/// Turn a title into a URL slug: lowercase ASCII alphanumerics separated by
/// single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

fn is_blank_or_http_url(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true;
    }
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.chars().any(char::is_whitespace))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::content::ContentElement;
    use crate::content::ContentSection;

    fn valid_form() -> ArticleForm {
        ArticleForm {
            title: "Hello World".into(),
            slug: "hello-world".into(),
            ..ArticleForm::default()
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn missing_title_and_slug() {
        let errors = ArticleForm::default().validate().unwrap_err();
        assert!(errors.get("title").is_some());
        assert!(errors.get("slug").is_some());
    }

    #[test]
    fn slug_pattern_enforced() {
        for bad in ["Hello", "hello world", "hello--world", "-hello", "hello-", "héllo"] {
            let form = ArticleForm {
                slug: bad.into(),
                ..valid_form()
            };
            let errors = form.validate().unwrap_err();
            assert!(errors.get("slug").is_some(), "slug {bad:?} should fail");
        }
    }

    #[test]
    fn urls_must_be_http() {
        let form = ArticleForm {
            author_link: "javascript:alert(1)".into(),
            main_image_url: "ftp://example.com/a.png".into(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("author_link").is_some());
        assert!(errors.get("main_image_url").is_some());

        let form = ArticleForm {
            author_link: "https://example.com/ada".into(),
            main_image_url: "http://example.com/a.png".into(),
            ..valid_form()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn slugify_titles() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust 2024: what's new  "), "rust-2024-what-s-new");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn fill_slug_keeps_explicit_slug() {
        let mut form = ArticleForm {
            title: "New Title".into(),
            slug: "kept".into(),
            ..ArticleForm::default()
        };
        form.fill_slug();
        assert_eq!(form.slug, "kept");

        form.slug.clear();
        form.fill_slug();
        assert_eq!(form.slug, "new-title");
    }

    #[test]
    fn status_round_trip() {
        for status in [
            ArticleStatus::Draft,
            ArticleStatus::Published,
            ArticleStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<ArticleStatus>().unwrap(), status);
        }
        assert!("deleted".parse::<ArticleStatus>().is_err());
    }

    #[test]
    fn derived_fields_are_not_accepted_from_clients() {
        let form: ArticleForm = serde_json::from_value(serde_json::json!({
            "title": "T",
            "slug": "t",
            "content": "<p>injected</p>",
            "generated_html": "<html>injected</html>"
        }))
        .unwrap();
        assert!(form.content.is_empty());
        assert!(form.generated_html.is_empty());
    }

    #[test]
    fn to_form_decodes_legacy_html() {
        let mut article = Article::from_form(Uuid::now_v7(), valid_form(), String::new(), None);
        article.content = "<section><h2>Old</h2><p>Body</p></section>".into();
        let form = article.to_form();
        let section = &form.structured_content.sections()[0];
        assert_eq!(section.elements.len(), 2);
        assert_eq!(section.elements[0].content, "Old");
        assert!(form.content.contains("<h2>Old</h2>"));
    }

    #[test]
    fn to_form_decodes_json() {
        let content = StructuredContent::new(vec![ContentSection::with_elements(vec![
            ContentElement::paragraph("Body"),
        ])]);
        let mut article = Article::from_form(Uuid::now_v7(), valid_form(), String::new(), None);
        article.content = content.to_json().unwrap();
        assert_eq!(article.to_form().structured_content, content);
    }

    #[test]
    fn document_meta_from_form() {
        let form = ArticleForm {
            excerpt: "Short".into(),
            publish_date: NaiveDate::from_ymd_opt(2024, 3, 9),
            ..valid_form()
        };
        let meta = DocumentMeta::from_form(&form);
        assert_eq!(meta.title, "Hello World");
        assert_eq!(meta.description, "Short");
        assert_eq!(meta.publish_date, "2024-03-09");
    }
}
