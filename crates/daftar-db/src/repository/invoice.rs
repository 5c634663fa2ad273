//! # Invoice Repository
//!
//! Sales and purchase invoices.
//!
//! ## Create Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. sequence::allocate(ledger)      → invoice_number (write lock held) │
//! │   2. person exists?                  → NotFound                         │
//! │   3. catalog entry exists + active?  → NotFound / Validation            │
//! │   4. INSERT INTO {sales,purchase}_invoices                              │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls back, releasing the number.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! Non-admins list, open and edit only invoices they created. Deleting is
//! admin only. Numbers never change and are never handed out again.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info, warn};

use super::{catalog, sequence};
use crate::error::{DbError, DbResult};
use daftar_core::service::StoredServiceRef;
use daftar_core::validation::{normalize_optional, validate_invoice};
use daftar_core::{
    Actor, Invoice, InvoiceInput, InvoiceKind, Ledger, Money, ServiceRef, SettlementType,
};

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, person_id, created_by, invoice_date,
    service_category, service_id, other_service_title,
    price, settlement_type, description, is_active, created_at, updated_at
"#;

/// Row shape shared by both invoice tables.
#[derive(Debug, sqlx::FromRow)]
struct InvoiceRecord {
    id: i64,
    invoice_number: i64,
    person_id: i64,
    created_by: Option<i64>,
    invoice_date: NaiveDate,
    service_category: String,
    service_id: Option<i64>,
    other_service_title: Option<String>,
    price: i64,
    settlement_type: SettlementType,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRecord {
    fn into_invoice(self, kind: InvoiceKind) -> DbResult<Invoice> {
        let stored = StoredServiceRef {
            service_category: self.service_category,
            service_id: self.service_id,
            other_service_title: self.other_service_title,
        };
        let service = ServiceRef::from_stored(&stored).map_err(|e| DbError::Corrupt {
            entity: kind.label().to_string(),
            id: self.id,
            reason: e.to_string(),
        })?;

        Ok(Invoice {
            id: self.id,
            kind,
            invoice_number: self.invoice_number,
            person_id: self.person_id,
            created_by: self.created_by,
            invoice_date: self.invoice_date,
            service,
            price: Money::from_minor(self.price),
            settlement_type: self.settlement_type,
            description: self.description,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn table(kind: InvoiceKind) -> &'static str {
    Ledger::from(kind).table()
}

async fn find_invoice<'e, E>(executor: E, kind: InvoiceKind, id: i64) -> DbResult<Option<Invoice>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", INVOICE_COLUMNS, table(kind));
    let record = sqlx::query_as::<_, InvoiceRecord>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    record.map(|r| r.into_invoice(kind)).transpose()
}

async fn ensure_person_exists<'e, E>(executor: E, person_id: i64) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM persons WHERE id = ?1")
        .bind(person_id)
        .fetch_optional(executor)
        .await?;

    found
        .map(|_| ())
        .ok_or_else(|| DbError::not_found("Person", person_id))
}

/// Repository for sales and purchase invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Creates an invoice owned by `actor` and assigns its number.
    ///
    /// ## Errors
    /// - `Validation` for bad fields, an inactive catalog entry
    /// - `NotFound` when the person or the catalog entry does not exist
    pub async fn create(
        &self,
        actor: &Actor,
        kind: InvoiceKind,
        input: &InvoiceInput,
    ) -> DbResult<Invoice> {
        validate_invoice(input)?;
        let stored = input.service.to_stored();
        let description = normalize_optional(input.description.as_deref());

        let mut tx = self.pool.begin().await?;

        let number = sequence::allocate(&mut *tx, Ledger::from(kind)).await?;
        ensure_person_exists(&mut *tx, input.person_id).await?;
        catalog::ensure_assignable(&mut *tx, &input.service).await?;

        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO {} (
                invoice_number, person_id, created_by, invoice_date,
                service_category, service_id, other_service_title,
                price, settlement_type, description, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?11)
            RETURNING id
            "#,
            table(kind)
        );
        let id: i64 = sqlx::query_scalar(&sql)
            .bind(number)
            .bind(input.person_id)
            .bind(actor.user_id)
            .bind(input.invoice_date)
            .bind(&stored.service_category)
            .bind(stored.service_id)
            .bind(&stored.other_service_title)
            .bind(input.price.minor())
            .bind(input.settlement_type)
            .bind(&description)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            kind = ?kind,
            id,
            invoice_number = number,
            created_by = actor.user_id,
            "Invoice created"
        );

        find_invoice(&self.pool, kind, id)
            .await?
            .ok_or_else(|| DbError::not_found(kind.label(), id))
    }

    /// Gets an invoice the actor may view.
    pub async fn get(&self, actor: &Actor, kind: InvoiceKind, id: i64) -> DbResult<Invoice> {
        let invoice = find_invoice(&self.pool, kind, id)
            .await?
            .ok_or_else(|| DbError::not_found(kind.label(), id))?;

        actor.ensure_view(invoice.created_by, "view another user's invoice")?;
        Ok(invoice)
    }

    /// Lists visible invoices, newest first (date, then number).
    pub async fn list(&self, actor: &Actor, kind: InvoiceKind) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM {}
            WHERE ?1 IS NULL OR created_by = ?1
            ORDER BY invoice_date DESC, invoice_number DESC
            "#,
            INVOICE_COLUMNS,
            table(kind)
        );
        let records = sqlx::query_as::<_, InvoiceRecord>(&sql)
            .bind(actor.owner_scope())
            .fetch_all(&self.pool)
            .await?;

        debug!(kind = ?kind, count = records.len(), "Invoices listed");
        records.into_iter().map(|r| r.into_invoice(kind)).collect()
    }

    /// Replaces an invoice's editable fields. The number is kept.
    ///
    /// A service that is unchanged may stay on an entry that has since been
    /// deactivated or deleted; a new one must be assignable.
    pub async fn update(
        &self,
        actor: &Actor,
        kind: InvoiceKind,
        id: i64,
        input: &InvoiceInput,
    ) -> DbResult<Invoice> {
        validate_invoice(input)?;

        let mut tx = self.pool.begin().await?;

        let current = find_invoice(&mut *tx, kind, id)
            .await?
            .ok_or_else(|| DbError::not_found(kind.label(), id))?;
        actor.ensure_edit(current.created_by, "edit another user's invoice")?;

        ensure_person_exists(&mut *tx, input.person_id).await?;
        if input.service != current.service {
            catalog::ensure_assignable(&mut *tx, &input.service).await?;
        }

        let stored = input.service.to_stored();
        let sql = format!(
            r#"
            UPDATE {} SET
                person_id = ?2,
                invoice_date = ?3,
                service_category = ?4,
                service_id = ?5,
                other_service_title = ?6,
                price = ?7,
                settlement_type = ?8,
                description = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            table(kind)
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(input.person_id)
            .bind(input.invoice_date)
            .bind(&stored.service_category)
            .bind(stored.service_id)
            .bind(&stored.other_service_title)
            .bind(input.price.minor())
            .bind(input.settlement_type)
            .bind(normalize_optional(input.description.as_deref()))
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(kind = ?kind, id, "Invoice updated");
        self.get(actor, kind, id).await
    }

    /// Deletes an invoice. Admin only; the number stays retired.
    pub async fn delete(&self, actor: &Actor, kind: InvoiceKind, id: i64) -> DbResult<()> {
        if let Err(e) = actor.ensure_delete("delete invoices") {
            warn!(user_id = actor.user_id, kind = ?kind, id, "Invoice delete denied");
            return Err(e.into());
        }

        let sql = format!("DELETE FROM {} WHERE id = ?1", table(kind));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(kind.label(), id));
        }

        info!(kind = ?kind, id, "Invoice deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
