//! # Person Repository
//!
//! Customer records. Persons are never hard-deleted: invoices keep pointing
//! at them, so "delete" means `is_active = 0`.
//!
//! ## Search
//! ```text
//! search("  al ")
//!   │
//!   ├── trim → "al" (fewer than 2 chars → empty list, no query)
//!   ├── active persons only
//!   ├── substring on first_name / last_name / national_id / phone_number
//!   └── first 10 rows → [{ id, text: "First Last (NationalID)" }]
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use daftar_core::validation::{normalize_search_query, validate_person};
use daftar_core::{Actor, Person, PersonInput, PersonSearchResult, ValidationError, PERSON_SEARCH_LIMIT};

const PERSON_COLUMNS: &str = r#"
    id, first_name, last_name, phone_number, phone_number_optional,
    national_id, address, description, is_active, created_at, updated_at
"#;

/// Repository for customer records.
#[derive(Debug, Clone)]
pub struct PersonRepository {
    pool: SqlitePool,
}

impl PersonRepository {
    /// Creates a new PersonRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PersonRepository { pool }
    }

    /// Gets a person by ID.
    pub async fn find(&self, id: i64) -> DbResult<Option<Person>> {
        let sql = format!("SELECT {} FROM persons WHERE id = ?1", PERSON_COLUMNS);
        let person = sqlx::query_as::<_, Person>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(person)
    }

    /// Gets a person by ID, failing with NotFound.
    pub async fn get(&self, id: i64) -> DbResult<Person> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("Person", id))
    }

    /// Lists persons ordered by name.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Person>> {
        let sql = format!(
            "SELECT {} FROM persons WHERE is_active = 1 OR ?1 ORDER BY first_name, last_name, id",
            PERSON_COLUMNS
        );
        let persons = sqlx::query_as::<_, Person>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(persons)
    }

    /// Creates a person.
    ///
    /// ## Errors
    /// - `Validation` for malformed fields
    /// - `Validation(Duplicate)` when the national id is taken
    pub async fn create(&self, input: &PersonInput) -> DbResult<Person> {
        let input = validate_person(input)?;
        self.ensure_national_id_free(&input.national_id, None).await?;

        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO persons (
                first_name, last_name, phone_number, phone_number_optional,
                national_id, address, description, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)
            RETURNING id
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone_number)
        .bind(&input.phone_number_optional)
        .bind(&input.national_id)
        .bind(&input.address)
        .bind(&input.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(id, national_id = %input.national_id, "Person created");
        self.get(id).await
    }

    /// Replaces a person's editable fields.
    pub async fn update(&self, id: i64, input: &PersonInput) -> DbResult<Person> {
        let input = validate_person(input)?;
        self.ensure_national_id_free(&input.national_id, Some(id)).await?;

        let result = sqlx::query(
            r#"
            UPDATE persons SET
                first_name = ?2,
                last_name = ?3,
                phone_number = ?4,
                phone_number_optional = ?5,
                national_id = ?6,
                address = ?7,
                description = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone_number)
        .bind(&input.phone_number_optional)
        .bind(&input.national_id)
        .bind(&input.address)
        .bind(&input.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Person", id));
        }

        debug!(id, "Person updated");
        self.get(id).await
    }

    /// Soft-deletes or restores a person. Admin only.
    pub async fn set_active(&self, actor: &Actor, id: i64, is_active: bool) -> DbResult<Person> {
        actor.ensure_delete("deactivate persons")?;

        let result = sqlx::query("UPDATE persons SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Person", id));
        }

        info!(id, is_active, "Person activation changed");
        self.get(id).await
    }

    /// Picker search over active persons.
    pub async fn search(&self, query: &str) -> DbResult<Vec<PersonSearchResult>> {
        let Some(query) = normalize_search_query(query) else {
            return Ok(Vec::new());
        };

        let pattern = format!("%{}%", escape_like(&query));
        let sql = format!(
            r#"
            SELECT {}
            FROM persons
            WHERE is_active = 1
              AND (
                first_name LIKE ?1 ESCAPE '\'
                OR last_name LIKE ?1 ESCAPE '\'
                OR national_id LIKE ?1 ESCAPE '\'
                OR phone_number LIKE ?1 ESCAPE '\'
              )
            ORDER BY first_name, last_name, id
            LIMIT ?2
            "#,
            PERSON_COLUMNS
        );

        let persons = sqlx::query_as::<_, Person>(&sql)
            .bind(pattern)
            .bind(PERSON_SEARCH_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        debug!(query = %query, results = persons.len(), "Person search");

        Ok(persons
            .iter()
            .map(|p| PersonSearchResult {
                id: p.id,
                text: p.search_text(),
            })
            .collect())
    }

    async fn ensure_national_id_free(&self, national_id: &str, except: Option<i64>) -> DbResult<()> {
        let taken: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM persons WHERE national_id = ?1 AND id IS NOT ?2",
        )
        .bind(national_id)
        .bind(except)
        .fetch_optional(&self.pool)
        .await?;

        if taken.is_some() {
            return Err(ValidationError::Duplicate {
                field: "national_id".to_string(),
                value: national_id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// =============================================================================
// Unit Tests
// =============================================================================
