//! Shared fixtures for handler tests.

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use daftar_core::{Actor, CatalogInput, Category, NewUser, PersonInput, Role, User, UserProfile};
use daftar_db::{Database, DbConfig};

use crate::auth::{AuthUser, JwtManager};
use crate::config::{ApiConfig, DEV_JWT_SECRET};
use crate::AppState;

pub const TEST_PASSWORD: &str = "s3cret-pass";

pub async fn test_state() -> Arc<AppState> {
    let config = ApiConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: ":memory:".to_string(),
        max_connections: 1,
        jwt_secret: DEV_JWT_SECRET.to_string(),
        jwt_lifetime_secs: 3600,
    };
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
    Arc::new(AppState { db, jwt, config })
}

pub async fn add_user(state: &AppState, username: &str, role: Role) -> User {
    state
        .db
        .users()
        .insert(&NewUser {
            username: username.to_string(),
            password: TEST_PASSWORD.to_string(),
            role,
            profile: UserProfile {
                first_name: "Test".to_string(),
                last_name: username.to_string(),
                ..Default::default()
            },
        })
        .await
        .unwrap()
}

pub fn auth_user(user: &User) -> AuthUser {
    AuthUser {
        actor: Actor::new(user.id, user.role),
        username: user.username.clone(),
    }
}

pub fn bearer(state: &AppState, user: &User) -> HeaderMap {
    let token = state.jwt.issue(user).unwrap();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

pub fn person_input(first: &str, last: &str, national_id: &str) -> PersonInput {
    PersonInput {
        first_name: first.to_string(),
        last_name: last.to_string(),
        phone_number: "09121234567".to_string(),
        national_id: national_id.to_string(),
        address: "Tehran".to_string(),
        ..Default::default()
    }
}

pub async fn add_service(state: &AppState, admin: &User, category: Category, name: &str) -> i64 {
    state
        .db
        .catalog()
        .create(
            &Actor::new(admin.id, admin.role),
            category,
            &CatalogInput {
                name: Some(name.to_string()),
                is_active: true,
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id()
}
