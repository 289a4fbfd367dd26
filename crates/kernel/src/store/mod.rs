//! Record stores.
//!
//! Articles, users and whitelist entries live behind async traits so the
//! server can run against PostgreSQL or entirely in memory. Handlers and
//! services only see `Arc<dyn ...Store>`.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Article, ArticleStatus, Role, User, WhitelistEntry};

pub use memory::{MemoryArticleStore, MemoryUserStore, MemoryWhitelistStore};
pub use postgres::{PgArticleStore, PgUserStore, PgWhitelistStore};

/// Default page size for article listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("{0}")]
    Conflict(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal store error")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

/// Article listing filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
    pub status: Option<ArticleStatus>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ArticleFilter {
    pub fn with_status(status: ArticleStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 500)
    }

    pub(crate) fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub(crate) fn matches(&self, article: &Article) -> bool {
        self.status.is_none_or(|s| article.status == s)
            && self
                .category
                .as_deref()
                .is_none_or(|c| article.category.as_deref() == Some(c))
    }
}

/// Article persistence.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert a new article. Fails with `Conflict` when the slug is taken.
    async fn create(&self, article: Article) -> StoreResult<Article>;

    /// Overwrite an existing article, keeping its `created` and
    /// `created_by`. Returns `None` when no article has that id.
    async fn update(&self, article: Article) -> StoreResult<Option<Article>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Article>>;

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Article>>;

    /// List articles, most recently changed first.
    async fn find_many(&self, filter: &ArticleFilter) -> StoreResult<Vec<Article>>;

    /// Delete an article. Returns whether it existed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Whether the backing store is reachable.
    async fn healthy(&self) -> bool;
}

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `Conflict` when the email is taken.
    async fn create(&self, user: User) -> StoreResult<User>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Look up a user by normalized email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>>;

    /// Record a successful login.
    async fn touch_login(&self, id: Uuid) -> StoreResult<()>;

    /// All users ordered by email.
    async fn list(&self) -> StoreResult<Vec<User>>;
}

/// Signup whitelist persistence.
#[async_trait]
pub trait WhitelistStore: Send + Sync {
    async fn find(&self, email: &str) -> StoreResult<Option<WhitelistEntry>>;

    /// Insert an entry, replacing the role of an existing one.
    async fn add(&self, entry: WhitelistEntry) -> StoreResult<WhitelistEntry>;

    /// Remove an entry. Returns whether it existed.
    async fn remove(&self, email: &str) -> StoreResult<bool>;

    /// All entries ordered by email.
    async fn list(&self) -> StoreResult<Vec<WhitelistEntry>>;
}

/// The full set of stores the application runs against.
#[derive(Clone)]
pub struct Stores {
    pub articles: Arc<dyn ArticleStore>,
    pub users: Arc<dyn UserStore>,
    pub whitelist: Arc<dyn WhitelistStore>,
}

impl Stores {
    /// Stores backed by process memory.
    pub fn memory() -> Self {
        Self {
            articles: Arc::new(MemoryArticleStore::new()),
            users: Arc::new(MemoryUserStore::new()),
            whitelist: Arc::new(MemoryWhitelistStore::new()),
        }
    }

    /// Stores backed by PostgreSQL.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            articles: Arc::new(PgArticleStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool.clone())),
            whitelist: Arc::new(PgWhitelistStore::new(pool)),
        }
    }
}
