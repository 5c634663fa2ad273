//! Fixtures shared by the repository tests.
//!
//! Users are inserted directly with a placeholder hash so tests do not pay
//! for argon2 on every fixture.

use chrono::Utc;

use crate::pool::{Database, DbConfig};
use daftar_core::{Actor, CatalogInput, Category, Person, PersonInput, Role};

pub async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Inserts a staff account and returns its actor.
pub async fn add_user(db: &Database, username: &str, first: &str, last: &str, role: Role) -> Actor {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, password_hash, first_name, last_name, role, created_at, updated_at)
        VALUES (?1, 'unused', ?2, ?3, ?4, ?5, ?5)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(first)
    .bind(last)
    .bind(role)
    .bind(now)
    .fetch_one(db.pool())
    .await
    .unwrap();

    Actor::new(id, role)
}

pub async fn add_person(db: &Database, first: &str, last: &str, national_id: &str) -> Person {
    db.persons()
        .create(&PersonInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone_number: "09121234567".to_string(),
            phone_number_optional: None,
            national_id: national_id.to_string(),
            address: "Tehran".to_string(),
            description: None,
        })
        .await
        .unwrap()
}

/// Adds an active entry to a named (non-loan) catalog and returns its id.
pub async fn add_service(db: &Database, admin: &Actor, category: Category, name: &str) -> i64 {
    db.catalog()
        .create(
            admin,
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
