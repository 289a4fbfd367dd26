//! HTTP route handlers.

pub mod admin;
pub mod article;
pub mod auth;
pub mod health;
pub mod helpers;

use axum::Router;

use crate::state::AppState;

/// All API routes. Session, CORS and tracing layers are added by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(article::router())
        .merge(admin::router())
}
