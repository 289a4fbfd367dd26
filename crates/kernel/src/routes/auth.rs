//! Authentication routes: signup, login, logout and the current session.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::AppResult;
use crate::models::{Permission, Role, User};
use crate::state::AppState;

/// Signup and login request body.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The logged-in user as seen by the client.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: uuid::Uuid,
    pub email: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        let permissions = Permission::ALL
            .into_iter()
            .filter(|p| user.can(*p))
            .collect();

        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            permissions,
        }
    }
}

/// Create an account and log it in.
async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Credentials>,
) -> AppResult<(StatusCode, Json<SessionUser>)> {
    let user = state.auth().sign_up(&body.email, &body.password).await?;
    state.auth().log_in(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Credentials>,
) -> AppResult<Json<SessionUser>> {
    let user = state.auth().sign_in(&body.email, &body.password).await?;
    state.auth().log_in(&session, &user).await?;
    Ok(Json(user.into()))
}

async fn logout(State(state): State<AppState>, session: Session) -> AppResult<StatusCode> {
    state.auth().log_out(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The current user, or `null` when logged out.
async fn current_session(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<Option<SessionUser>>> {
    let user = state.auth().current_user(&session).await?;
    Ok(Json(user.map(SessionUser::from)))
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(current_session))
}
