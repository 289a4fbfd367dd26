//! PostgreSQL stores.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ArticleFilter, ArticleStore, StoreError, StoreResult, UserStore, WhitelistStore};
use crate::db;
use crate::models::{Article, ArticleStatus, Role, User, WhitelistEntry};

/// Map unique-constraint violations to `Conflict`.
fn map_unique(e: sqlx::Error, message: impl FnOnce() -> String) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(message()),
        _ => StoreError::Database(e),
    }
}

const ARTICLE_COLUMNS: &str = "id, title, slug, excerpt, author, author_link, publish_date, \
     category, tags, status, main_image_url, main_image_alt, main_image_caption, intro_text, \
     content, generated_html, created_by, created, changed";

#[derive(FromRow)]
struct ArticleRow {
    id: Uuid,
    title: String,
    slug: String,
    excerpt: String,
    author: String,
    author_link: String,
    publish_date: Option<NaiveDate>,
    category: Option<String>,
    tags: Vec<String>,
    status: String,
    main_image_url: String,
    main_image_alt: String,
    main_image_caption: String,
    intro_text: String,
    content: String,
    generated_html: String,
    created_by: Option<Uuid>,
    created: DateTime<Utc>,
    changed: DateTime<Utc>,
}

impl TryFrom<ArticleRow> for Article {
    type Error = StoreError;

    fn try_from(row: ArticleRow) -> StoreResult<Self> {
        let status = row
            .status
            .parse::<ArticleStatus>()
            .with_context(|| format!("article {} has an invalid status", row.id))?;

        Ok(Article {
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            author: row.author,
            author_link: row.author_link,
            publish_date: row.publish_date,
            category: row.category,
            tags: row.tags,
            status,
            main_image_url: row.main_image_url,
            main_image_alt: row.main_image_alt,
            main_image_caption: row.main_image_caption,
            intro_text: row.intro_text,
            content: row.content,
            generated_html: row.generated_html,
            created_by: row.created_by,
            created: row.created,
            changed: row.changed,
        })
    }
}

/// Article store backed by the `articles` table.
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn create(&self, article: Article) -> StoreResult<Article> {
        let sql = format!(
            "INSERT INTO articles ({ARTICLE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
             RETURNING {ARTICLE_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(article.id)
            .bind(&article.title)
            .bind(&article.slug)
            .bind(&article.excerpt)
            .bind(&article.author)
            .bind(&article.author_link)
            .bind(article.publish_date)
            .bind(&article.category)
            .bind(&article.tags)
            .bind(article.status.as_str())
            .bind(&article.main_image_url)
            .bind(&article.main_image_alt)
            .bind(&article.main_image_caption)
            .bind(&article.intro_text)
            .bind(&article.content)
            .bind(&article.generated_html)
            .bind(article.created_by)
            .bind(article.created)
            .bind(article.changed)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, || format!("slug '{}' is already in use", article.slug)))?;

        row.try_into()
    }

    async fn update(&self, article: Article) -> StoreResult<Option<Article>> {
        let sql = format!(
            "UPDATE articles SET title = $2, slug = $3, excerpt = $4, author = $5, \
             author_link = $6, publish_date = $7, category = $8, tags = $9, status = $10, \
             main_image_url = $11, main_image_alt = $12, main_image_caption = $13, \
             intro_text = $14, content = $15, generated_html = $16, changed = now() \
             WHERE id = $1 RETURNING {ARTICLE_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(article.id)
            .bind(&article.title)
            .bind(&article.slug)
            .bind(&article.excerpt)
            .bind(&article.author)
            .bind(&article.author_link)
            .bind(article.publish_date)
            .bind(&article.category)
            .bind(&article.tags)
            .bind(article.status.as_str())
            .bind(&article.main_image_url)
            .bind(&article.main_image_alt)
            .bind(&article.main_image_caption)
            .bind(&article.intro_text)
            .bind(&article.content)
            .bind(&article.generated_html)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique(e, || format!("slug '{}' is already in use", article.slug)))?;

        row.map(Article::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Article>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Article::try_from).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Article>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE slug = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Article::try_from).transpose()
    }

    async fn find_many(&self, filter: &ArticleFilter) -> StoreResult<Vec<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE ($1::text IS NULL OR status = $1) \
               AND ($2::text IS NULL OR category = $2) \
             ORDER BY changed DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );

        let rows = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.category.as_deref())
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Article::try_from).collect()
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn healthy(&self) -> bool {
        db::check_health(&self.pool).await
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    pass: String,
    role: String,
    created: DateTime<Utc>,
    login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        let role = row
            .role
            .parse::<Role>()
            .with_context(|| format!("user {} has an invalid role", row.id))?;

        Ok(User {
            id: row.id,
            email: row.email,
            pass: row.pass,
            role,
            created: row.created,
            login: row.login,
        })
    }
}

/// User store backed by the `users` table.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: User) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, pass, role, created, login)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, pass, role, created, login
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.pass)
        .bind(user.role.as_str())
        .bind(user.created)
        .bind(user.login)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, || format!("email '{}' is already registered", user.email)))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, pass, role, created, login FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, pass, role, created, login FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET role = $2 WHERE id = $1
            RETURNING id, email, pass, role, created, login
            "#,
        )
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn touch_login(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE users SET login = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, pass, role, created, login FROM users ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}

#[derive(FromRow)]
struct WhitelistRow {
    email: String,
    role: String,
    created: DateTime<Utc>,
}

impl TryFrom<WhitelistRow> for WhitelistEntry {
    type Error = StoreError;

    fn try_from(row: WhitelistRow) -> StoreResult<Self> {
        let role = row
            .role
            .parse::<Role>()
            .with_context(|| format!("whitelist entry {} has an invalid role", row.email))?;

        Ok(WhitelistEntry {
            email: row.email,
            role,
            created: row.created,
        })
    }
}

/// Whitelist store backed by the `signup_whitelist` table.
pub struct PgWhitelistStore {
    pool: PgPool,
}

impl PgWhitelistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WhitelistStore for PgWhitelistStore {
    async fn find(&self, email: &str) -> StoreResult<Option<WhitelistEntry>> {
        let row = sqlx::query_as::<_, WhitelistRow>(
            "SELECT email, role, created FROM signup_whitelist WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WhitelistEntry::try_from).transpose()
    }

    async fn add(&self, entry: WhitelistEntry) -> StoreResult<WhitelistEntry> {
        let row = sqlx::query_as::<_, WhitelistRow>(
            r#"
            INSERT INTO signup_whitelist (email, role, created)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
            RETURNING email, role, created
            "#,
        )
        .bind(&entry.email)
        .bind(entry.role.as_str())
        .bind(entry.created)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn remove(&self, email: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM signup_whitelist WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> StoreResult<Vec<WhitelistEntry>> {
        let rows = sqlx::query_as::<_, WhitelistRow>(
            "SELECT email, role, created FROM signup_whitelist ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WhitelistEntry::try_from).collect()
    }
}
