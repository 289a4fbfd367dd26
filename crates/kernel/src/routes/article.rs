//! Article routes: CRUD, stored HTML, preview and SEO score.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::content::{ElementType, FieldValues, SeoReport, StructuredContent};
use crate::error::{AppError, AppResult};
use crate::models::{Article, ArticleForm, ArticleStatus, ArticleSummary, Permission, User};
use crate::routes::helpers::require;
use crate::state::AppState;
use crate::store::ArticleFilter;

/// Create/update request: the form plus edits not yet committed to it.
#[derive(Debug, Deserialize)]
pub struct SaveArticleRequest {
    #[serde(flatten)]
    pub form: ArticleForm,
    #[serde(default)]
    pub field_values: FieldValues,
}

/// An article opened for editing.
#[derive(Debug, Serialize)]
pub struct EditableArticle {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub changed: DateTime<Utc>,
    #[serde(flatten)]
    pub form: ArticleForm,
}

/// Rendered preview of an unsaved form.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub content: String,
    pub generated_html: String,
    pub structured_content: StructuredContent,
    pub seo: SeoReport,
}

/// An element type offered by the editor.
#[derive(Debug, Serialize)]
pub struct ElementTypeInfo {
    #[serde(rename = "type")]
    pub element_type: String,
    pub label: String,
}

impl From<&ElementType> for ElementTypeInfo {
    fn from(element_type: &ElementType) -> Self {
        Self {
            element_type: element_type.as_str().to_string(),
            label: element_type.label().to_string(),
        }
    }
}

impl From<Article> for EditableArticle {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            created: article.created,
            changed: article.changed,
            form: article.to_form(),
        }
    }
}

/// Publishing needs its own permission on top of editing.
fn check_publish(user: &User, status: ArticleStatus) -> AppResult<()> {
    if status == ArticleStatus::Published && !user.can(Permission::PublishArticles) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

async fn list_articles(
    State(state): State<AppState>,
    session: Session,
    Query(filter): Query<ArticleFilter>,
) -> AppResult<Json<Vec<ArticleSummary>>> {
    require(&state, &session, Permission::ViewArticles).await?;
    Ok(Json(state.articles().list(&filter).await?))
}

async fn create_article(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SaveArticleRequest>,
) -> AppResult<(StatusCode, Json<Article>)> {
    let user = require(&state, &session, Permission::EditArticles).await?;
    check_publish(&user, body.form.status)?;

    let article = state
        .articles()
        .create(body.form, &body.field_values, Some(&user))
        .await?;
    Ok((StatusCode::CREATED, Json(article)))
}

async fn get_article(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EditableArticle>> {
    require(&state, &session, Permission::ViewArticles).await?;
    let article = state.articles().load(id).await?;
    Ok(Json(article.into()))
}

async fn get_article_by_slug(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> AppResult<Json<EditableArticle>> {
    require(&state, &session, Permission::ViewArticles).await?;
    let article = state.articles().load_by_slug(&slug).await?;
    Ok(Json(article.into()))
}

async fn update_article(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(body): Json<SaveArticleRequest>,
) -> AppResult<Json<Article>> {
    let user = require(&state, &session, Permission::EditArticles).await?;
    check_publish(&user, body.form.status)?;

    let article = state
        .articles()
        .update(id, body.form, &body.field_values)
        .await?;
    Ok(Json(article))
}

async fn delete_article(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require(&state, &session, Permission::EditArticles).await?;
    state.articles().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The document rendered at the last save.
async fn article_html(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Html<String>> {
    require(&state, &session, Permission::ViewArticles).await?;
    let article = state.articles().load(id).await?;
    Ok(Html(article.generated_html))
}

async fn preview(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SaveArticleRequest>,
) -> AppResult<Json<PreviewResponse>> {
    require(&state, &session, Permission::EditArticles).await?;
    let preview = state.articles().preview(body.form, &body.field_values)?;
    Ok(Json(PreviewResponse {
        content: preview.form.content,
        generated_html: preview.form.generated_html,
        structured_content: preview.form.structured_content,
        seo: preview.seo,
    }))
}

async fn seo_score(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<ArticleForm>,
) -> AppResult<Json<SeoReport>> {
    require(&state, &session, Permission::EditArticles).await?;
    Ok(Json(state.articles().seo_report(&form)))
}

/// The element types the editor can add, in palette order.
async fn element_types(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<Vec<ElementTypeInfo>>> {
    require(&state, &session, Permission::EditArticles).await?;
    Ok(Json(ElementType::ALL.iter().map(ElementTypeInfo::from).collect()))
}

/// Create the article router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/articles", get(list_articles).post(create_article))
        .route(
            "/api/articles/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/api/articles/{id}/html", get(article_html))
        .route("/api/articles/by-slug/{slug}", get(get_article_by_slug))
        .route("/api/element-types", get(element_types))
        .route("/api/preview", post(preview))
        .route("/api/seo-score", post(seo_score))
}
