//! # Invoice Number Allocation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create invoice                                                         │
//! │    BEGIN                                                                │
//! │      allocate(ledger)   ◄── first statement, and it is a write:         │
//! │                             the transaction holds the write lock        │
//! │      checks + INSERT        from here on, so no other writer can        │
//! │    COMMIT                   read the same counter value                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter also never drops below the highest number already stored,
//! so rows imported with explicit numbers are not collided with.

use daftar_core::numbering::Ledger;
use daftar_core::INVOICE_NUMBER_FLOOR;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

/// Takes the next number of `ledger`. Must run inside the insert's transaction.
pub async fn allocate(conn: &mut SqliteConnection, ledger: Ledger) -> DbResult<i64> {
    let sql = format!(
        r#"
        INSERT INTO invoice_sequences (name, last_value)
        VALUES (?1, MAX(COALESCE((SELECT MAX(invoice_number) FROM {table}), 0), ?2) + 1)
        ON CONFLICT(name) DO UPDATE SET
            last_value = MAX(
                last_value,
                COALESCE((SELECT MAX(invoice_number) FROM {table}), 0)
            ) + 1
        RETURNING last_value
        "#,
        table = ledger.table()
    );

    let number: i64 = sqlx::query_scalar(&sql)
        .bind(ledger.sequence_name())
        .bind(INVOICE_NUMBER_FLOOR - 1)
        .fetch_one(&mut *conn)
        .await?;

    debug!(ledger = ledger.sequence_name(), number, "Allocated invoice number");
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_first_number_is_floor_then_increments() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(allocate(&mut tx, Ledger::Sales).await.unwrap(), 1000);
        assert_eq!(allocate(&mut tx, Ledger::Sales).await.unwrap(), 1001);
        tx.commit().await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(allocate(&mut tx, Ledger::Sales).await.unwrap(), 1002);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_counter_never_drops_below_stored_numbers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = chrono::Utc::now();

        // A row imported with an explicit number, before any allocation.
        sqlx::query(
            "INSERT INTO expense_invoices (invoice_number, amount, subject, date, created_at, updated_at) VALUES (1500, 100, 'Imported', '2024-01-01', ?1, ?1)",
        )
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(allocate(&mut tx, Ledger::Expense).await.unwrap(), 1501);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_ledgers_are_independent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(allocate(&mut tx, Ledger::Expense).await.unwrap(), 1000);
        assert_eq!(allocate(&mut tx, Ledger::Income).await.unwrap(), 1000);
        assert_eq!(allocate(&mut tx, Ledger::Expense).await.unwrap(), 1001);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_rolled_back_allocation_is_released() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(allocate(&mut tx, Ledger::Purchase).await.unwrap(), 1000);
        tx.rollback().await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(allocate(&mut tx, Ledger::Purchase).await.unwrap(), 1000);
        tx.commit().await.unwrap();
    }
}
