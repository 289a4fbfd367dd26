//! Inkwell blog backoffice kernel.
//!
//! Structured article content, record stores, services and the JSON API.
//! The `inkwell` binary wraps this library with the server and operator CLI.

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
