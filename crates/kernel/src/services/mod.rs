//! Business logic between the HTTP layer and the stores.

pub mod article;
pub mod auth;

pub use article::{ArticleError, ArticlePreview, ArticleService};
pub use auth::{AuthError, AuthService};
