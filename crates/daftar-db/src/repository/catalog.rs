//! # Catalog Repository
//!
//! The five service catalogs and service reference resolution.
//!
//! ## Tables
//! ```text
//! ┌──────────────────────────┬──────────────────────────────────────────┐
//! │ legal_services           │                                          │
//! │ commercial_services      │  id, name, description, is_active        │
//! │ leasing_services         │                                          │
//! │ registration_services    │                                          │
//! ├──────────────────────────┼──────────────────────────────────────────┤
//! │ loan_services            │  id, bank_name, plan_name,               │
//! │                          │  max_repayment_months, max_plan_amount,  │
//! │                          │  description, is_active                  │
//! └──────────────────────────┴──────────────────────────────────────────┘
//! ```
//! Table names come from [`Category::table`], never from user input.

use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use daftar_core::service::{
    loan_display_name, CatalogEntry, LoanService, NamedService, ServiceChoice,
};
use daftar_core::validation::validate_catalog_input;
use daftar_core::{Actor, CatalogInput, Category, Money, ResolvedService, ServiceRef, ValidationError};

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct NamedRecord {
    id: i64,
    name: String,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NamedRecord {
    fn into_entry(self, category: Category) -> CatalogEntry {
        CatalogEntry::Named(NamedService {
            id: self.id,
            category,
            name: self.name,
            description: self.description,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LoanRecord {
    id: i64,
    bank_name: String,
    plan_name: String,
    max_repayment_months: i64,
    max_plan_amount: i64,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LoanRecord> for CatalogEntry {
    fn from(r: LoanRecord) -> Self {
        CatalogEntry::Loan(LoanService {
            id: r.id,
            bank_name: r.bank_name,
            plan_name: r.plan_name,
            max_repayment_months: r.max_repayment_months,
            max_plan_amount: Money::from_minor(r.max_plan_amount),
            description: r.description,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

const NAMED_COLUMNS: &str = "id, name, description, is_active, created_at, updated_at";
const LOAN_COLUMNS: &str = "id, bank_name, plan_name, max_repayment_months, max_plan_amount, \
                            description, is_active, created_at, updated_at";

// =============================================================================
// Executor-generic lookups (shared with invoice transactions)
// =============================================================================

/// Looks up one catalog entry. `None` when the row does not exist.
pub(crate) async fn find_entry<'e, E>(
    executor: E,
    category: Category,
    id: i64,
) -> DbResult<Option<CatalogEntry>>
where
    E: SqliteExecutor<'e>,
{
    if category == Category::Loan {
        let sql = format!("SELECT {} FROM loan_services WHERE id = ?1", LOAN_COLUMNS);
        let record = sqlx::query_as::<_, LoanRecord>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        return Ok(record.map(CatalogEntry::from));
    }

    let sql = format!("SELECT {} FROM {} WHERE id = ?1", NAMED_COLUMNS, category.table());
    let record = sqlx::query_as::<_, NamedRecord>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(record.map(|r| r.into_entry(category)))
}

/// Fails unless `service` may be put on a new invoice: catalog references
/// must point at an existing, active entry.
pub(crate) async fn ensure_assignable<'e, E>(executor: E, service: &ServiceRef) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    let Some((category, id)) = service.catalog_key() else {
        return Ok(());
    };

    match find_entry(executor, category, id).await? {
        None => Err(DbError::not_found(format!("{} service", category), id)),
        Some(entry) if !entry.is_active() => Err(ValidationError::invalid(
            "service_id",
            format!("{} service {} is inactive", category, id),
        )
        .into()),
        Some(_) => Ok(()),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the service catalogs.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    pub async fn find(&self, category: Category, id: i64) -> DbResult<Option<CatalogEntry>> {
        find_entry(&self.pool, category, id).await
    }

    pub async fn get(&self, category: Category, id: i64) -> DbResult<CatalogEntry> {
        self.find(category, id)
            .await?
            .ok_or_else(|| DbError::not_found(format!("{} service", category), id))
    }

    /// All entries of a category, inactive included, in choice-list order.
    pub async fn list(&self, category: Category) -> DbResult<Vec<CatalogEntry>> {
        if category == Category::Loan {
            let sql = format!(
                "SELECT {} FROM loan_services ORDER BY bank_name, plan_name, id",
                LOAN_COLUMNS
            );
            let records = sqlx::query_as::<_, LoanRecord>(&sql)
                .fetch_all(&self.pool)
                .await?;
            return Ok(records.into_iter().map(CatalogEntry::from).collect());
        }

        let sql = format!(
            "SELECT {} FROM {} ORDER BY name, id",
            NAMED_COLUMNS,
            category.table()
        );
        let records = sqlx::query_as::<_, NamedRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(|r| r.into_entry(category)).collect())
    }

    /// Active entries of a category as `{id, name}` pairs.
    ///
    /// Loans are ordered by bank then plan and named `"bank - plan"`.
    pub async fn list_choices(&self, category: Category) -> DbResult<Vec<ServiceChoice>> {
        if category == Category::Loan {
            let rows: Vec<(i64, String, String)> = sqlx::query_as(
                r#"
                SELECT id, bank_name, plan_name
                FROM loan_services
                WHERE is_active = 1
                ORDER BY bank_name, plan_name, id
                "#,
            )
            .fetch_all(&self.pool)
            .await?;

            return Ok(rows
                .into_iter()
                .map(|(id, bank, plan)| ServiceChoice {
                    id,
                    name: loan_display_name(&bank, &plan),
                })
                .collect());
        }

        let sql = format!(
            "SELECT id, name FROM {} WHERE is_active = 1 ORDER BY name, id",
            category.table()
        );
        let rows: Vec<(i64, String)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        debug!(category = %category, count = rows.len(), "Service choices loaded");
        Ok(rows
            .into_iter()
            .map(|(id, name)| ServiceChoice { id, name })
            .collect())
    }

    /// Resolves a service reference for display. Never fails on a missing row.
    pub async fn resolve(&self, service: &ServiceRef) -> DbResult<ResolvedService> {
        let entry = match service.catalog_key() {
            Some((category, id)) => self.find(category, id).await?,
            None => None,
        };
        Ok(ResolvedService::resolve(service, entry.as_ref()))
    }

    /// Creates a catalog entry. Admin only.
    pub async fn create(
        &self,
        actor: &Actor,
        category: Category,
        input: &CatalogInput,
    ) -> DbResult<CatalogEntry> {
        actor.ensure_admin("edit service catalogs")?;
        let input = validate_catalog_input(category, input)?;
        let now = Utc::now();

        let id: i64 = if category == Category::Loan {
            sqlx::query_scalar(
                r#"
                INSERT INTO loan_services (
                    bank_name, plan_name, max_repayment_months, max_plan_amount,
                    description, is_active, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                RETURNING id
                "#,
            )
            .bind(&input.bank_name)
            .bind(&input.plan_name)
            .bind(input.max_repayment_months)
            .bind(input.max_plan_amount.map(|m| m.minor()))
            .bind(&input.description)
            .bind(input.is_active)
            .bind(now)
            .fetch_one(&self.pool)
            .await?
        } else {
            let sql = format!(
                r#"
                INSERT INTO {} (name, description, is_active, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?4)
                RETURNING id
                "#,
                category.table()
            );
            sqlx::query_scalar(&sql)
                .bind(&input.name)
                .bind(&input.description)
                .bind(input.is_active)
                .bind(now)
                .fetch_one(&self.pool)
                .await?
        };

        info!(category = %category, id, "Catalog entry created");
        self.get(category, id).await
    }

    /// Replaces a catalog entry's fields. Admin only.
    pub async fn update(
        &self,
        actor: &Actor,
        category: Category,
        id: i64,
        input: &CatalogInput,
    ) -> DbResult<CatalogEntry> {
        actor.ensure_admin("edit service catalogs")?;
        let input = validate_catalog_input(category, input)?;
        let now = Utc::now();

        let result = if category == Category::Loan {
            sqlx::query(
                r#"
                UPDATE loan_services SET
                    bank_name = ?2,
                    plan_name = ?3,
                    max_repayment_months = ?4,
                    max_plan_amount = ?5,
                    description = ?6,
                    is_active = ?7,
                    updated_at = ?8
                WHERE id = ?1
                "#,
            )
            .bind(id)
            .bind(&input.bank_name)
            .bind(&input.plan_name)
            .bind(input.max_repayment_months)
            .bind(input.max_plan_amount.map(|m| m.minor()))
            .bind(&input.description)
            .bind(input.is_active)
            .bind(now)
            .execute(&self.pool)
            .await?
        } else {
            let sql = format!(
                r#"
                UPDATE {} SET name = ?2, description = ?3, is_active = ?4, updated_at = ?5
                WHERE id = ?1
                "#,
                category.table()
            );
            sqlx::query(&sql)
                .bind(id)
                .bind(&input.name)
                .bind(&input.description)
                .bind(input.is_active)
                .bind(now)
                .execute(&self.pool)
                .await?
        };

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("{} service", category), id));
        }

        debug!(category = %category, id, "Catalog entry updated");
        self.get(category, id).await
    }

    /// Activates or deactivates an entry. Admin only.
    pub async fn set_active(
        &self,
        actor: &Actor,
        category: Category,
        id: i64,
        is_active: bool,
    ) -> DbResult<CatalogEntry> {
        actor.ensure_admin("edit service catalogs")?;

        let sql = format!(
            "UPDATE {} SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            category.table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(is_active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("{} service", category), id));
        }

        info!(category = %category, id, is_active, "Catalog entry activation changed");
        self.get(category, id).await
    }

    /// Removes an entry. Invoices that referenced it resolve to the
    /// deleted-service placeholder afterwards. Admin only.
    pub async fn delete(&self, actor: &Actor, category: Category, id: i64) -> DbResult<()> {
        actor.ensure_delete("delete catalog entries")?;

        let sql = format!("DELETE FROM {} WHERE id = ?1", category.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("{} service", category), id));
        }

        info!(category = %category, id, "Catalog entry deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn named(name: &str, is_active: bool) -> CatalogInput {
        CatalogInput {
            name: Some(name.to_string()),
            is_active,
            ..Default::default()
        }
    }

    fn loan(bank: &str, plan: &str) -> CatalogInput {
        CatalogInput {
            bank_name: Some(bank.to_string()),
            plan_name: Some(plan.to_string()),
            max_repayment_months: Some(36),
            max_plan_amount: Some(Money::from_major(500_000_000)),
            is_active: true,
            ..Default::default()
        }
    }

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_choices_active_only_sorted_by_name() {
        let db = setup().await;
        let admin = Actor::admin(1);
        let catalog = db.catalog();

        catalog.create(&admin, Category::Legal, &named("Contract review", true)).await.unwrap();
        catalog.create(&admin, Category::Legal, &named("Arbitration", true)).await.unwrap();
        catalog.create(&admin, Category::Legal, &named("Appeal", false)).await.unwrap();

        let names: Vec<_> = catalog
            .list_choices(Category::Legal)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Arbitration", "Contract review"]);

        assert_eq!(catalog.list(Category::Legal).await.unwrap().len(), 3);
        assert!(catalog.list_choices(Category::Commercial).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_loan_choices_ordered_by_bank_then_plan() {
        let db = setup().await;
        let admin = Actor::admin(1);
        let catalog = db.catalog();

        catalog.create(&admin, Category::Loan, &loan("Mellat", "Home")).await.unwrap();
        catalog.create(&admin, Category::Loan, &loan("Melli", "Car")).await.unwrap();
        catalog.create(&admin, Category::Loan, &loan("Mellat", "Business")).await.unwrap();

        let names: Vec<_> = catalog
            .list_choices(Category::Loan)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Mellat - Business", "Mellat - Home", "Melli - Car"]);
    }

    #[tokio::test]
    async fn test_ids_are_per_catalog() {
        let db = setup().await;
        let admin = Actor::admin(1);
        let catalog = db.catalog();

        let legal = catalog.create(&admin, Category::Legal, &named("Contract review", true)).await.unwrap();
        let commercial = catalog
            .create(&admin, Category::Commercial, &named("Customs clearance", true))
            .await
            .unwrap();
        assert_eq!(legal.id(), commercial.id());

        let resolved = catalog.resolve(&ServiceRef::Commercial(commercial.id())).await.unwrap();
        assert_eq!(resolved.display_name(), "Customs clearance");
    }

    #[tokio::test]
    async fn test_resolve_after_delete_uses_placeholder() {
        let db = setup().await;
        let admin = Actor::admin(1);
        let catalog = db.catalog();

        let entry = catalog.create(&admin, Category::Leasing, &named("Car leasing", true)).await.unwrap();
        catalog.delete(&admin, Category::Leasing, entry.id()).await.unwrap();

        let resolved = catalog.resolve(&ServiceRef::Leasing(entry.id())).await.unwrap();
        assert!(resolved.is_deleted());
        assert_eq!(resolved.display_name(), format!("Deleted service (#{})", entry.id()));

        // The freed id is not reissued.
        let next = catalog.create(&admin, Category::Leasing, &named("Truck leasing", true)).await.unwrap();
        assert!(next.id() > entry.id());
        assert!(catalog.resolve(&ServiceRef::Leasing(entry.id())).await.unwrap().is_deleted());
    }

    #[tokio::test]
    async fn test_inactive_entry_still_resolves_but_is_not_assignable() {
        let db = setup().await;
        let admin = Actor::admin(1);
        let catalog = db.catalog();

        let entry = catalog
            .create(&admin, Category::Registration, &named("Trademark", true))
            .await
            .unwrap();
        catalog.set_active(&admin, Category::Registration, entry.id(), false).await.unwrap();

        let service = ServiceRef::Registration(entry.id());
        assert_eq!(catalog.resolve(&service).await.unwrap().display_name(), "Trademark");
        assert!(matches!(
            ensure_assignable(db.pool(), &service).await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            ensure_assignable(db.pool(), &ServiceRef::Registration(999)).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_only_admin_edits_catalog() {
        let db = setup().await;
        let err = db
            .catalog()
            .create(&Actor::user(2), Category::Legal, &named("Notary", true))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::PermissionDenied { .. }));
    }
}
