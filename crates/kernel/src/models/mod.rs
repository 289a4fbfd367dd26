//! Records: articles, users, roles and the signup whitelist.

pub mod article;
pub mod role;
pub mod user;
pub mod whitelist;

pub use article::{Article, ArticleForm, ArticleStatus, ArticleSummary};
pub use role::{Permission, Role};
pub use user::User;
pub use whitelist::WhitelistEntry;
