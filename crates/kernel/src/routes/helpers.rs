//! Shared route helpers.

use tower_sessions::Session;

use crate::error::AppResult;
use crate::models::{Permission, User};
use crate::state::AppState;

/// Require a logged-in user whose role grants `permission`.
///
/// Fails with 401 when nobody is logged in and 403 when the role lacks the
/// permission.
pub async fn require(
    state: &AppState,
    session: &Session,
    permission: Permission,
) -> AppResult<User> {
    Ok(state.auth().require(session, permission).await?)
}

/// HTML-escape a string for safe output in text and attribute positions.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
