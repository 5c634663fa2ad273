//! Staff accounts.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use daftar_core::{EmploymentStatus, NewUser, Role, User, UserProfile};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
    pub current_status: EmploymentStatus,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub current_password: Option<String>,
    pub new_password: String,
}

/// `GET /api/users`
pub async fn list(State(state): State<Arc<AppState>>, auth: AuthUser) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.users().list(&auth.actor).await?))
}

/// `GET /api/users/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    auth.actor
        .ensure_self_or_admin(id, "view another user's profile")?;
    Ok(Json(state.db.users().get(id).await?))
}

/// `POST /api/users`
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(new_user): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.db.users().create(&auth.actor, &new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /api/users/{id}`
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(profile): Json<UserProfile>,
) -> ApiResult<Json<User>> {
    Ok(Json(
        state.db.users().update_profile(&auth.actor, id, &profile).await?,
    ))
}

/// `PUT /api/users/{id}/role`
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<RoleRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .db
        .users()
        .set_role_and_status(&auth.actor, id, req.role, req.current_status, req.is_active)
        .await?;
    Ok(Json(user))
}

/// `PUT /api/users/{id}/password`
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<PasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .db
        .users()
        .change_password(
            &auth.actor,
            id,
            req.current_password.as_deref(),
            &req.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
