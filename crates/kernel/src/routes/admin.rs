//! Admin routes: signup whitelist and user roles.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Permission, Role, User, WhitelistEntry};
use crate::routes::helpers::require;
use crate::state::AppState;

/// Whitelist request body.
#[derive(Debug, Deserialize)]
pub struct WhitelistRequest {
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Reader
}

/// Role change request body.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

async fn list_whitelist(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<Vec<WhitelistEntry>>> {
    require(&state, &session, Permission::ManageWhitelist).await?;
    Ok(Json(state.auth().whitelist_list().await?))
}

async fn add_whitelist(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<WhitelistRequest>,
) -> AppResult<(StatusCode, Json<WhitelistEntry>)> {
    let admin = require(&state, &session, Permission::ManageWhitelist).await?;
    let entry = state.auth().whitelist_add(&body.email, body.role).await?;
    info!(admin_id = %admin.id, email = %entry.email, "whitelist updated");
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn remove_whitelist(
    State(state): State<AppState>,
    session: Session,
    Path(email): Path<String>,
) -> AppResult<StatusCode> {
    require(&state, &session, Permission::ManageWhitelist).await?;
    if !state.auth().whitelist_remove(&email).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(State(state): State<AppState>, session: Session) -> AppResult<Json<Vec<User>>> {
    require(&state, &session, Permission::ManageUsers).await?;
    Ok(Json(state.auth().list_users().await?))
}

async fn set_user_role(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(body): Json<RoleRequest>,
) -> AppResult<Json<User>> {
    let admin = require(&state, &session, Permission::ManageUsers).await?;

    // An admin demoting themselves could leave the site without one
    if admin.id == id && body.role != Role::Admin {
        return Err(AppError::BadRequest(
            "admins cannot change their own role".to_string(),
        ));
    }

    let user = state
        .auth()
        .set_role(id, body.role)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/whitelist",
            get(list_whitelist).post(add_whitelist),
        )
        .route("/api/admin/whitelist/{email}", delete(remove_whitelist))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/role", put(set_user_role))
}
