//! Login and the current-user endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use daftar_core::User;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .users()
        .authenticate(&req.username, &req.password)
        .await?
        .ok_or_else(|| {
            warn!(username = %req.username, "Login failed");
            ApiError::unauthenticated("Invalid username or password")
        })?;

    let token = state.jwt.issue(&user)?;
    info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.lifetime_secs(),
        user,
    }))
}

/// `GET /api/auth/me`
pub async fn me(State(state): State<Arc<AppState>>, auth: AuthUser) -> ApiResult<Json<User>> {
    Ok(Json(state.db.users().get(auth.actor.user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_user, test_state};
    use axum::http::StatusCode;
    use daftar_core::Role;

    #[tokio::test]
    async fn test_login_issues_usable_token() {
        let state = test_state().await;
        add_user(&state, "ali", Role::User).await;

        let Json(resp) = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "ali".to_string(),
                password: "s3cret-pass".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(resp.user.username, "ali");
        let claims = state.jwt.validate_token(&resp.token).unwrap();
        assert_eq!(claims.sub, resp.user.id);
    }

    #[tokio::test]
    async fn test_wrong_password_is_401() {
        let state = test_state().await;
        add_user(&state, "ali", Role::User).await;

        let err = login(
            State(state),
            Json(LoginRequest {
                username: "ali".to_string(),
                password: "not-it".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
