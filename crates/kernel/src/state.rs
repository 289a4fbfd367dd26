//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::models::Role;
use crate::services::{ArticleService, AuthService};
use crate::store::Stores;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Record stores (PostgreSQL or in-memory).
    stores: Stores,

    /// Article save flow and reads.
    articles: ArticleService,

    /// Auth, sessions and the signup whitelist.
    auth: AuthService,
}

impl AppState {
    /// Connect to PostgreSQL, apply migrations and seed the whitelist.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config).await?;
        db::run_migrations(&pool).await?;
        info!("Database migrations applied");

        let state = Self::from_stores(config, Stores::postgres(pool));
        state.seed_whitelist(config).await?;
        Ok(state)
    }

    /// State backed by in-memory stores, seeded from the config.
    pub async fn in_memory(config: &Config) -> Result<Self> {
        let state = Self::from_stores(config, Stores::memory());
        state.seed_whitelist(config).await?;
        Ok(state)
    }

    /// Build state over an existing set of stores.
    pub fn from_stores(config: &Config, stores: Stores) -> Self {
        let articles = ArticleService::new(stores.articles.clone())
            .with_lang(&config.site_lang)
            .with_site_name(&config.site_name);
        let auth = AuthService::new(stores.users.clone(), stores.whitelist.clone());

        Self {
            inner: Arc::new(AppStateInner {
                stores,
                articles,
                auth,
            }),
        }
    }

    /// Put the configured emails on the signup whitelist.
    ///
    /// Existing entries keep their role, except the bootstrap admin which is
    /// always (re)set to admin.
    pub async fn seed_whitelist(&self, config: &Config) -> Result<()> {
        for email in &config.signup_whitelist {
            self.inner
                .auth
                .whitelist_seed(email, Role::Reader)
                .await
                .with_context(|| format!("failed to whitelist {email}"))?;
        }

        if let Some(email) = &config.bootstrap_admin_email {
            self.inner
                .auth
                .whitelist_add(email, Role::Admin)
                .await
                .with_context(|| format!("failed to whitelist bootstrap admin {email}"))?;
            info!(email = %email, "bootstrap admin whitelisted");
        }

        Ok(())
    }

    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    pub fn articles(&self) -> &ArticleService {
        &self.inner.articles
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Whether the article store is reachable.
    pub async fn store_healthy(&self) -> bool {
        self.inner.stores.articles.healthy().await
    }
}
