//! # Finance Repository
//!
//! Expense and income ledgers (numbered like invoices) and payroll.
//!
//! ```text
//! ┌──────────────────┬──────────────┬─────────────────────────────────────┐
//! │ Record           │ Numbered     │ Who may write                       │
//! ├──────────────────┼──────────────┼─────────────────────────────────────┤
//! │ expense_invoices │ expense seq  │ any user (own rows), admin deletes  │
//! │ income_invoices  │ income seq   │ any user (own rows), admin deletes  │
//! │ salaries         │ no           │ admin only                          │
//! └──────────────────┴──────────────┴─────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use super::sequence;
use crate::error::{DbError, DbResult};
use daftar_core::validation::{normalize_optional, validate_ledger_entry, validate_salary};
use daftar_core::{
    Actor, EntryKind, Ledger, LedgerEntry, LedgerEntryInput, Money, Salary, SalaryInput,
};

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct EntryRecord {
    id: i64,
    invoice_number: i64,
    amount: i64,
    subject: String,
    date: NaiveDate,
    description: Option<String>,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EntryRecord {
    fn into_entry(self, kind: EntryKind) -> LedgerEntry {
        LedgerEntry {
            id: self.id,
            kind,
            invoice_number: self.invoice_number,
            amount: Money::from_minor(self.amount),
            subject: self.subject,
            date: self.date,
            description: self.description,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SalaryRecord {
    id: i64,
    employee_id: i64,
    date: NaiveDate,
    amount: i64,
    is_paid: bool,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SalaryRecord> for Salary {
    fn from(r: SalaryRecord) -> Self {
        Salary {
            id: r.id,
            employee_id: r.employee_id,
            date: r.date,
            amount: Money::from_minor(r.amount),
            is_paid: r.is_paid,
            description: r.description,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const ENTRY_COLUMNS: &str =
    "id, invoice_number, amount, subject, date, description, created_by, created_at, updated_at";
pub(crate) const SALARY_COLUMNS: &str =
    "id, employee_id, date, amount, is_paid, description, created_at, updated_at";

fn entity(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Expense => "Expense invoice",
        EntryKind::Income => "Income invoice",
    }
}

fn table(kind: EntryKind) -> &'static str {
    Ledger::from(kind).table()
}

async fn find_entry<'e, E>(executor: E, kind: EntryKind, id: i64) -> DbResult<Option<LedgerEntry>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", ENTRY_COLUMNS, table(kind));
    let record = sqlx::query_as::<_, EntryRecord>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(record.map(|r| r.into_entry(kind)))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the expense/income ledgers and salaries.
#[derive(Debug, Clone)]
pub struct FinanceRepository {
    pool: SqlitePool,
}

impl FinanceRepository {
    /// Creates a new FinanceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FinanceRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Expense / income entries
    // -------------------------------------------------------------------------

    /// Records an expense or income and assigns its number.
    pub async fn create_entry(
        &self,
        actor: &Actor,
        kind: EntryKind,
        input: &LedgerEntryInput,
    ) -> DbResult<LedgerEntry> {
        let input = validate_ledger_entry(input)?;

        let mut tx = self.pool.begin().await?;
        let number = sequence::allocate(&mut *tx, Ledger::from(kind)).await?;

        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO {} (
                invoice_number, amount, subject, date, description,
                created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING id
            "#,
            table(kind)
        );
        let id: i64 = sqlx::query_scalar(&sql)
            .bind(number)
            .bind(input.amount.minor())
            .bind(&input.subject)
            .bind(input.date)
            .bind(&input.description)
            .bind(actor.user_id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(kind = ?kind, id, invoice_number = number, "Ledger entry created");
        find_entry(&self.pool, kind, id)
            .await?
            .ok_or_else(|| DbError::not_found(entity(kind), id))
    }

    pub async fn get_entry(&self, actor: &Actor, kind: EntryKind, id: i64) -> DbResult<LedgerEntry> {
        let entry = find_entry(&self.pool, kind, id)
            .await?
            .ok_or_else(|| DbError::not_found(entity(kind), id))?;

        actor.ensure_view(entry.created_by, "view another user's ledger entry")?;
        Ok(entry)
    }

    /// Lists visible entries, newest first.
    pub async fn list_entries(&self, actor: &Actor, kind: EntryKind) -> DbResult<Vec<LedgerEntry>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM {}
            WHERE ?1 IS NULL OR created_by = ?1
            ORDER BY date DESC, invoice_number DESC
            "#,
            ENTRY_COLUMNS,
            table(kind)
        );
        let records = sqlx::query_as::<_, EntryRecord>(&sql)
            .bind(actor.owner_scope())
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(|r| r.into_entry(kind)).collect())
    }

    /// Replaces an entry's fields. The number is kept.
    pub async fn update_entry(
        &self,
        actor: &Actor,
        kind: EntryKind,
        id: i64,
        input: &LedgerEntryInput,
    ) -> DbResult<LedgerEntry> {
        let input = validate_ledger_entry(input)?;
        let current = find_entry(&self.pool, kind, id)
            .await?
            .ok_or_else(|| DbError::not_found(entity(kind), id))?;
        actor.ensure_edit(current.created_by, "edit another user's ledger entry")?;

        let sql = format!(
            r#"
            UPDATE {} SET amount = ?2, subject = ?3, date = ?4, description = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
            table(kind)
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(input.amount.minor())
            .bind(&input.subject)
            .bind(input.date)
            .bind(&input.description)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        debug!(kind = ?kind, id, "Ledger entry updated");
        self.get_entry(actor, kind, id).await
    }

    /// Deletes an entry. Admin only; the number stays retired.
    pub async fn delete_entry(&self, actor: &Actor, kind: EntryKind, id: i64) -> DbResult<()> {
        actor.ensure_delete("delete ledger entries")?;

        let sql = format!("DELETE FROM {} WHERE id = ?1", table(kind));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(entity(kind), id));
        }

        info!(kind = ?kind, id, "Ledger entry deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Salaries
    // -------------------------------------------------------------------------

    /// Records a salary for an employee. Admin only.
    pub async fn create_salary(&self, actor: &Actor, input: &SalaryInput) -> DbResult<Salary> {
        actor.ensure_admin("record salaries")?;
        validate_salary(input)?;

        let employee: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
            .bind(input.employee_id)
            .fetch_optional(&self.pool)
            .await?;
        if employee.is_none() {
            return Err(DbError::not_found("User", input.employee_id));
        }

        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO salaries (employee_id, date, amount, is_paid, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING id
            "#,
        )
        .bind(input.employee_id)
        .bind(input.date)
        .bind(input.amount.minor())
        .bind(input.is_paid)
        .bind(normalize_optional(input.description.as_deref()))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(id, employee_id = input.employee_id, "Salary recorded");
        self.get_salary(actor, id).await
    }

    /// Gets a salary. Employees may read their own.
    pub async fn get_salary(&self, actor: &Actor, id: i64) -> DbResult<Salary> {
        let sql = format!("SELECT {} FROM salaries WHERE id = ?1", SALARY_COLUMNS);
        let salary: Salary = sqlx::query_as::<_, SalaryRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Salary", id))?
            .into();

        actor.ensure_self_or_admin(salary.employee_id, "view another employee's salary")?;
        Ok(salary)
    }

    /// Lists salaries, newest first.
    ///
    /// Admins see everyone (optionally one employee); other users only
    /// ever see their own.
    pub async fn list_salaries(&self, actor: &Actor, employee_id: Option<i64>) -> DbResult<Vec<Salary>> {
        let employee_id = match (actor.owner_scope(), employee_id) {
            (None, requested) => requested,
            (Some(own), None) => Some(own),
            (Some(own), Some(requested)) => {
                actor.ensure_self_or_admin(requested, "view another employee's salary")?;
                Some(own)
            }
        };

        let sql = format!(
            "SELECT {} FROM salaries WHERE ?1 IS NULL OR employee_id = ?1 ORDER BY date DESC, id DESC",
            SALARY_COLUMNS
        );
        let records = sqlx::query_as::<_, SalaryRecord>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(Salary::from).collect())
    }

    /// Marks a salary paid or unpaid. Admin only.
    pub async fn set_paid(&self, actor: &Actor, id: i64, is_paid: bool) -> DbResult<Salary> {
        actor.ensure_admin("change salary payment status")?;

        let result = sqlx::query("UPDATE salaries SET is_paid = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(is_paid)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Salary", id));
        }

        info!(id, is_paid, "Salary payment status changed");
        self.get_salary(actor, id).await
    }

    /// Deletes a salary. Admin only.
    pub async fn delete_salary(&self, actor: &Actor, id: i64) -> DbResult<()> {
        actor.ensure_delete("delete salaries")?;

        let result = sqlx::query("DELETE FROM salaries WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Salary", id));
        }

        info!(id, "Salary deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_user, setup};
    use daftar_core::Role;

    fn entry(amount: i64, subject: &str) -> LedgerEntryInput {
        LedgerEntryInput {
            amount: Money::from_major(amount),
            subject: subject.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            description: None,
        }
    }

    fn salary(employee_id: i64, amount: i64, is_paid: bool) -> SalaryInput {
        SalaryInput {
            employee_id,
            date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            amount: Money::from_major(amount),
            is_paid,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_expense_and_income_number_independently() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let finance = db.finance();

        let e1 = finance.create_entry(&admin, EntryKind::Expense, &entry(50, "Rent")).await.unwrap();
        let e2 = finance.create_entry(&admin, EntryKind::Expense, &entry(20, "Paper")).await.unwrap();
        let i1 = finance.create_entry(&admin, EntryKind::Income, &entry(900, "Fees")).await.unwrap();

        assert_eq!((e1.invoice_number, e2.invoice_number), (1000, 1001));
        assert_eq!(i1.invoice_number, 1000);
        assert_eq!(i1.kind, EntryKind::Income);
    }

    #[tokio::test]
    async fn test_entry_validation_and_delete_rules() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let clerk = add_user(&db, "clerk", "Cyrus", "Clerk", Role::User).await;
        let finance = db.finance();

        assert!(matches!(
            finance.create_entry(&clerk, EntryKind::Expense, &entry(0, "Rent")).await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            finance.create_entry(&clerk, EntryKind::Expense, &entry(10, "   ")).await,
            Err(DbError::Validation(_))
        ));

        let own = finance.create_entry(&clerk, EntryKind::Expense, &entry(10, "Taxi")).await.unwrap();
        assert!(matches!(
            finance.delete_entry(&clerk, EntryKind::Expense, own.id).await,
            Err(DbError::PermissionDenied { .. })
        ));

        finance.delete_entry(&admin, EntryKind::Expense, own.id).await.unwrap();
        let next = finance.create_entry(&clerk, EntryKind::Expense, &entry(10, "Taxi")).await.unwrap();
        assert_eq!(next.invoice_number, 1001);
    }

    #[tokio::test]
    async fn test_entries_scoped_to_creator() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let clerk = add_user(&db, "clerk", "Cyrus", "Clerk", Role::User).await;
        let finance = db.finance();

        let by_admin = finance.create_entry(&admin, EntryKind::Income, &entry(10, "Fees")).await.unwrap();
        finance.create_entry(&clerk, EntryKind::Income, &entry(10, "Fees")).await.unwrap();

        assert_eq!(finance.list_entries(&clerk, EntryKind::Income).await.unwrap().len(), 1);
        assert_eq!(finance.list_entries(&admin, EntryKind::Income).await.unwrap().len(), 2);
        assert!(matches!(
            finance.get_entry(&clerk, EntryKind::Income, by_admin.id).await,
            Err(DbError::PermissionDenied { .. })
        ));
    }

    #[tokio::test]
    async fn test_salary_rules() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let clerk = add_user(&db, "clerk", "Cyrus", "Clerk", Role::User).await;
        let other = add_user(&db, "other", "Omid", "Other", Role::User).await;
        let finance = db.finance();

        assert!(matches!(
            finance.create_salary(&clerk, &salary(clerk.user_id, 100, false)).await,
            Err(DbError::PermissionDenied { .. })
        ));
        assert!(matches!(
            finance.create_salary(&admin, &salary(999, 100, false)).await,
            Err(DbError::NotFound { .. })
        ));

        let s = finance.create_salary(&admin, &salary(clerk.user_id, 100, false)).await.unwrap();
        finance.create_salary(&admin, &salary(other.user_id, 100, false)).await.unwrap();
        assert!(!s.is_paid);

        assert_eq!(finance.list_salaries(&clerk, None).await.unwrap().len(), 1);
        assert_eq!(finance.list_salaries(&admin, None).await.unwrap().len(), 2);
        assert_eq!(finance.list_salaries(&admin, Some(clerk.user_id)).await.unwrap().len(), 1);
        assert!(matches!(
            finance.list_salaries(&clerk, Some(other.user_id)).await,
            Err(DbError::PermissionDenied { .. })
        ));

        assert!(matches!(
            finance.set_paid(&clerk, s.id, true).await,
            Err(DbError::PermissionDenied { .. })
        ));
        let paid = finance.set_paid(&admin, s.id, true).await.unwrap();
        assert!(paid.is_paid);
        assert!(finance.get_salary(&clerk, s.id).await.unwrap().is_paid);
    }
}
