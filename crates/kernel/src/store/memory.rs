//! In-memory stores for tests and `--in-memory` runs.
//!
//! Uniqueness (article slug, user email) is enforced through secondary
//! DashMap indexes claimed with the entry API.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{ArticleFilter, ArticleStore, StoreError, StoreResult, UserStore, WhitelistStore};
use crate::models::{Article, Role, User, WhitelistEntry};

fn slug_conflict(slug: &str) -> StoreError {
    StoreError::Conflict(format!("slug '{slug}' is already in use"))
}

/// Article store backed by a DashMap.
#[derive(Default)]
pub struct MemoryArticleStore {
    articles: DashMap<Uuid, Article>,
    slugs: DashMap<String, Uuid>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `slug` at `id`, failing if another article holds it.
    fn claim_slug(&self, slug: &str, id: Uuid) -> StoreResult<()> {
        match self.slugs.entry(slug.to_string()) {
            Entry::Occupied(e) if *e.get() != id => Err(slug_conflict(slug)),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(e) => {
                e.insert(id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn create(&self, article: Article) -> StoreResult<Article> {
        self.claim_slug(&article.slug, article.id)?;
        self.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn update(&self, mut article: Article) -> StoreResult<Option<Article>> {
        let Some(existing) = self.articles.get(&article.id).map(|a| a.clone()) else {
            return Ok(None);
        };

        if existing.slug != article.slug {
            self.claim_slug(&article.slug, article.id)?;
            self.slugs.remove_if(&existing.slug, |_, id| *id == article.id);
        }

        article.created = existing.created;
        article.created_by = existing.created_by;
        article.changed = Utc::now();
        self.articles.insert(article.id, article.clone());
        Ok(Some(article))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Article>> {
        Ok(self.articles.get(&id).map(|a| a.clone()))
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Article>> {
        let Some(id) = self.slugs.get(slug).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn find_many(&self, filter: &ArticleFilter) -> StoreResult<Vec<Article>> {
        let mut articles: Vec<Article> = self
            .articles
            .iter()
            .filter(|a| filter.matches(a.value()))
            .map(|a| a.value().clone())
            .collect();
        articles.sort_by(|a, b| b.changed.cmp(&a.changed).then_with(|| b.id.cmp(&a.id)));

        Ok(articles
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(0))
            .take(usize::try_from(filter.limit()).unwrap_or(0))
            .collect())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        match self.articles.remove(&id) {
            Some((_, article)) => {
                self.slugs.remove_if(&article.slug, |_, owner| *owner == id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn healthy(&self) -> bool {
        true
    }
}

/// User store backed by a DashMap.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: User) -> StoreResult<User> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::Conflict(format!(
                    "email '{}' is already registered",
                    user.email
                )));
            }
            Entry::Vacant(e) => {
                e.insert(user.id);
            }
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let Some(id) = self.emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>> {
        Ok(self.users.get_mut(&id).map(|mut user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn touch_login(&self, id: Uuid) -> StoreResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.login = Some(Utc::now());
        }
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }
}

/// Whitelist store backed by a DashMap keyed by normalized email.
#[derive(Default)]
pub struct MemoryWhitelistStore {
    entries: DashMap<String, WhitelistEntry>,
}

impl MemoryWhitelistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WhitelistStore for MemoryWhitelistStore {
    async fn find(&self, email: &str) -> StoreResult<Option<WhitelistEntry>> {
        Ok(self.entries.get(email).map(|e| e.clone()))
    }

    async fn add(&self, entry: WhitelistEntry) -> StoreResult<WhitelistEntry> {
        let stored = self
            .entries
            .entry(entry.email.clone())
            .and_modify(|existing| existing.role = entry.role)
            .or_insert(entry)
            .clone();
        Ok(stored)
    }

    async fn remove(&self, email: &str) -> StoreResult<bool> {
        Ok(self.entries.remove(email).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<WhitelistEntry>> {
        let mut entries: Vec<WhitelistEntry> =
            self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(entries)
    }
}
