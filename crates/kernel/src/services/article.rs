//! Article service: the save flow and read access.
//!
//! Saving regenerates every derived value from the structured content:
//! pending field values are committed through the editor, the fragment and
//! the standalone document are rendered, and the row is written in a single
//! statement. Concurrent saves are last-write-wins.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::content::seo;
use crate::content::{
    ContentEditor, DocumentMeta, FieldValues, SeoReport, render_document, render_fragment,
};
use crate::error::ValidationErrors;
use crate::models::{Article, ArticleForm, ArticleSummary, User};
use crate::store::{ArticleFilter, ArticleStore, StoreError};

/// Article service errors.
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    #[error("article not found")]
    NotFound,

    #[error("slug '{0}' is already in use")]
    SlugTaken(String),

    #[error("failed to serialize content")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to save article")]
    Store(#[source] StoreError),
}

impl From<StoreError> for ArticleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ArticleError::NotFound,
            e => ArticleError::Store(e),
        }
    }
}

/// Rendered output of a form that was not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ArticlePreview {
    /// The form with pending field values applied and derived HTML filled.
    pub form: ArticleForm,
    pub seo: SeoReport,
}

/// Article business logic over an [`ArticleStore`].
#[derive(Clone)]
pub struct ArticleService {
    articles: Arc<dyn ArticleStore>,
    lang: String,
    site_name: String,
}

impl ArticleService {
    pub fn new(articles: Arc<dyn ArticleStore>) -> Self {
        Self {
            articles,
            lang: "en".to_string(),
            site_name: String::new(),
        }
    }

    /// Set the document language written into exported HTML.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Set the publication name written into exported HTML.
    pub fn with_site_name(mut self, site_name: impl Into<String>) -> Self {
        self.site_name = site_name.into();
        self
    }

    /// Validate the form and fill its derived values.
    ///
    /// Returns the form ready to persist together with the content JSON.
    fn prepare(
        &self,
        mut form: ArticleForm,
        values: &FieldValues,
    ) -> Result<(ArticleForm, String), ArticleError> {
        form.fill_slug();
        form.validate()?;
        let json = self.render(&mut form, values)?;
        Ok((form, json))
    }

    /// Commit field values and regenerate `content` and `generated_html`.
    fn render(&self, form: &mut ArticleForm, values: &FieldValues) -> Result<String, ArticleError> {
        let mut editor = ContentEditor::from_content(std::mem::take(&mut form.structured_content));
        let serialized = editor.collect_and_serialize(values)?;

        let mut meta = DocumentMeta::from_form(form);
        meta.lang.clone_from(&self.lang);
        meta.site_name.clone_from(&self.site_name);

        form.generated_html = render_document(&meta, &serialized.content);
        form.content = serialized.html;
        form.structured_content = serialized.content;
        Ok(serialized.json)
    }

    /// Create a new article from the form.
    pub async fn create(
        &self,
        form: ArticleForm,
        values: &FieldValues,
        author: Option<&User>,
    ) -> Result<Article, ArticleError> {
        let (form, json) = self.prepare(form, values)?;
        let slug = form.slug.clone();
        let article = Article::from_form(Uuid::now_v7(), form, json, author.map(|u| u.id));

        let article = self
            .articles
            .create(article)
            .await
            .map_err(|e| self.persist_failed(None, &slug, e))?;

        info!(
            article_id = %article.id,
            slug = %article.slug,
            status = %article.status,
            "article created"
        );
        Ok(article)
    }

    /// Overwrite an existing article with the form.
    pub async fn update(
        &self,
        id: Uuid,
        form: ArticleForm,
        values: &FieldValues,
    ) -> Result<Article, ArticleError> {
        let (form, json) = self.prepare(form, values)?;
        let slug = form.slug.clone();
        let article = Article::from_form(id, form, json, None);

        let article = self
            .articles
            .update(article)
            .await
            .map_err(|e| self.persist_failed(Some(id), &slug, e))?
            .ok_or(ArticleError::NotFound)?;

        info!(
            article_id = %article.id,
            slug = %article.slug,
            status = %article.status,
            "article saved"
        );
        Ok(article)
    }

    fn persist_failed(&self, id: Option<Uuid>, slug: &str, e: StoreError) -> ArticleError {
        match e {
            StoreError::Conflict(_) => ArticleError::SlugTaken(slug.to_string()),
            e => {
                error!(article_id = ?id, slug = %slug, error = %e, "failed to persist article");
                ArticleError::Store(e)
            }
        }
    }

    pub async fn load(&self, id: Uuid) -> Result<Article, ArticleError> {
        self.articles
            .find_by_id(id)
            .await?
            .ok_or(ArticleError::NotFound)
    }

    pub async fn load_by_slug(&self, slug: &str) -> Result<Article, ArticleError> {
        self.articles
            .find_by_slug(slug)
            .await?
            .ok_or(ArticleError::NotFound)
    }

    /// Load an article as an editable form with decoded content.
    pub async fn load_form(&self, id: Uuid) -> Result<ArticleForm, ArticleError> {
        Ok(self.load(id).await?.to_form())
    }

    pub async fn list(&self, filter: &ArticleFilter) -> Result<Vec<ArticleSummary>, ArticleError> {
        let articles = self.articles.find_many(filter).await?;
        Ok(articles.iter().map(Article::summary).collect())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ArticleError> {
        if !self.articles.delete(id).await? {
            return Err(ArticleError::NotFound);
        }
        info!(article_id = %id, "article deleted");
        Ok(())
    }

    /// Render the form without validating or persisting it.
    pub fn preview(
        &self,
        mut form: ArticleForm,
        values: &FieldValues,
    ) -> Result<ArticlePreview, ArticleError> {
        self.render(&mut form, values)?;
        let seo = seo::evaluate(&form.seo_input(&form.content));
        Ok(ArticlePreview { form, seo })
    }

    /// Score the form as it stands.
    pub fn seo_report(&self, form: &ArticleForm) -> SeoReport {
        let html = render_fragment(&form.structured_content);
        seo::evaluate(&form.seo_input(&html))
    }
}
